use anyhow::Context;
use lensmart_api::{
    db::{DbPool, connect, run_migrations},
    services::auth_service::hash_password,
};
use rand::{Rng, distributions::Alphanumeric};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let (pool, orm) = connect(&database_url).await?;
    run_migrations(&orm).await?;

    let email = std::env::var("DEFAULT_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@lensmart.local".to_string());
    let password = match std::env::var("DEFAULT_ADMIN_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            let generated: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(16)
                .map(char::from)
                .collect();
            println!("DEFAULT_ADMIN_PASSWORD not set, generated: {generated}");
            generated
        }
    };

    let admin_id = ensure_admin(&pool, &email, &password).await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

/// Inserts a verified admin or promotes the existing account with that email.
async fn ensure_admin(pool: &DbPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO accounts (id, username, email, password_hash, first_name, last_name, role, is_email_verified)
        VALUES ($1, 'admin', $2, $3, 'System', 'Admin', 'admin', TRUE)
        ON CONFLICT (email) DO UPDATE SET role = 'admin', is_email_verified = TRUE
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured admin {email}");
    Ok(id)
}

async fn upsert_named(
    pool: &DbPool,
    table: &str,
    name: &str,
    description: &str,
) -> anyhow::Result<Uuid> {
    let sql = format!(
        "INSERT INTO {table} (id, name, description) VALUES ($1, $2, $3) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id"
    );
    let (id,): (Uuid,) = sqlx::query_as(&sql)
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

async fn seed_catalog(pool: &DbPool) -> anyhow::Result<()> {
    let canon = upsert_named(pool, "brands", "Canon", "Cameras and lenses").await?;
    let sony = upsert_named(pool, "brands", "Sony", "Mirrorless systems").await?;
    let fujifilm = upsert_named(pool, "brands", "Fujifilm", "X and GFX systems").await?;
    let mirrorless =
        upsert_named(pool, "product_types", "Mirrorless", "Interchangeable lens, no mirror").await?;
    let dslr = upsert_named(pool, "product_types", "DSLR", "Digital single-lens reflex").await?;

    let products = [
        ("Canon EOS R6 Mark II", "EOS-R6M2", canon, mirrorless, 56_990_000_i64, 8, "Full frame", 24.2, "RF"),
        ("Canon EOS 90D", "EOS-90D", canon, dslr, 27_490_000, 5, "APS-C", 32.5, "EF-S"),
        ("Sony Alpha 7 IV", "ILCE-7M4", sony, mirrorless, 54_990_000, 10, "Full frame", 33.0, "E"),
        ("Fujifilm X-T5", "X-T5", fujifilm, mirrorless, 43_990_000, 6, "APS-C", 40.2, "X"),
    ];

    for (name, model, brand_id, type_id, price, stock, sensor, megapixels, mount) in products {
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, model, brand_id, price, stock, camera_type, sensor_type, megapixels, lens_mount)
            SELECT $1, $2, $3, $4, $5, $6, 'digital', $7, $8, $9
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE model = $3)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(model)
        .bind(brand_id)
        .bind(price)
        .bind(stock)
        .bind(sensor)
        .bind(megapixels)
        .bind(mount)
        .fetch_optional(pool)
        .await?;

        if let Some((product_id,)) = inserted {
            sqlx::query(
                "INSERT INTO product_categories (product_id, product_type_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(product_id)
            .bind(type_id)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded demo catalog");
    Ok(())
}
