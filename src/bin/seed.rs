use std::collections::HashMap;

use anyhow::Context;
use cardapio::{
    auth::{password::hash_password, repo::User},
    categories::repo as categories,
    products::repo as products,
    state::AppState,
};
use tracing::info;
use uuid::Uuid;

/// Loads the fixture catalog: one admin account, the category tree and
/// the starting menu. Existing data is wiped first.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "seed=info,cardapio=info".to_string()),
        )
        .init();

    let state = AppState::init().await?;
    sqlx::migrate!("./migrations")
        .run(&state.db)
        .await
        .context("run migrations")?;

    sqlx::query("TRUNCATE users, categories, products")
        .execute(&state.db)
        .await
        .context("truncate tables")?;

    let hash = hash_password("root")?;
    let admin = User::create(&state.db, "admin@mail.com", &hash).await?;
    info!(user_id = %admin.id, email = %admin.email, "admin user created");

    // Parents are created before their children, so the lookup below
    // always resolves.
    let tree: [(&str, Option<&str>); 7] = [
        ("Bebidas", None),
        ("Sucos", Some("Bebidas")),
        ("Refrigerantes", Some("Bebidas")),
        ("Comida Japonesa", None),
        ("Pizzas", None),
        ("Pizzas Doces", Some("Pizzas")),
        ("Pizzas Salgadas", Some("Pizzas")),
    ];
    let mut ids: HashMap<&str, Uuid> = HashMap::new();
    for (name, parent) in tree {
        let parent_id = parent.map(|p| ids[p]);
        let category = categories::create(&state.db, name, parent_id).await?;
        ids.insert(name, category.id);
    }
    info!(count = tree.len(), "categories created");

    let menu: [(&str, i32, f64, &[&str]); 8] = [
        ("Água 350ML", 1, 1.49, &["Bebidas"]),
        ("Suco de Laranja (Jarra)", 1, 14.99, &["Sucos", "Bebidas"]),
        ("Coca-Cola Lata 350ML", 1, 5.49, &["Refrigerantes", "Bebidas"]),
        ("Fanta Laranja Lata 350ML", 1, 3.99, &["Refrigerantes", "Bebidas"]),
        ("Temaki", 8, 44.99, &["Comida Japonesa"]),
        ("Sushi", 12, 49.99, &["Comida Japonesa"]),
        ("Pizza de Calabresa", 1, 59.99, &["Pizzas Salgadas", "Pizzas"]),
        ("Pizza de Brigadeiro", 1, 69.99, &["Pizzas Doces", "Pizzas"]),
    ];
    for (name, qty, price, category_names) in menu {
        let category_ids: Vec<Uuid> = category_names.iter().map(|n| ids[n]).collect();
        products::create(&state.db, name, price, qty, &category_ids).await?;
    }
    info!(count = menu.len(), "products created");

    Ok(())
}
