// bin/seed.rs - seed the database with demo accounts and listings
use clap::Parser;
use sqlx::PgPool;
use uuid::Uuid;

use homelet_api::auth;
use homelet_api::database;
use homelet_api::database::models::account::Role;
use homelet_api::database::models::property::{self, NewProperty};

#[derive(Parser)]
#[command(name = "seed")]
#[command(about = "Seed the homelet database with demo accounts and properties")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Delete all existing rows before seeding")]
    wipe: bool,

    #[arg(
        long,
        default_value = "password123",
        help = "Password for the demo accounts"
    )]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let pool = database::connect().await?;
    database::migrate(&pool).await?;

    if cli.wipe {
        wipe(&pool).await?;
        println!("Cleared existing data");
    }

    let password_hash = auth::hash_password(&cli.password)?;
    let owner_id = upsert_account(
        &pool,
        "Asha Rao",
        "owner@example.com",
        &password_hash,
        Role::Owner,
        Some("+91 98450 11111"),
    )
    .await?;
    let _tenant_id = upsert_account(
        &pool,
        "Vikram Shetty",
        "tenant@example.com",
        &password_hash,
        Role::Tenant,
        Some("+91 98860 22222"),
    )
    .await?;

    // Re-seed the demo owner's listings from scratch each run
    sqlx::query("DELETE FROM properties WHERE owner_id = $1")
        .bind(owner_id)
        .execute(&pool)
        .await?;

    let count = seed_properties(&pool, owner_id).await?;

    println!("Seeded {count} properties");
    println!("  owner:  owner@example.com / {}", cli.password);
    println!("  tenant: tenant@example.com / {}", cli.password);

    Ok(())
}

async fn wipe(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query("TRUNCATE payments, requests, properties, accounts")
        .execute(pool)
        .await?;
    Ok(())
}

async fn upsert_account(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
    phone: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id = sqlx::query_scalar(
        "INSERT INTO accounts (name, email, password_hash, role, phone)
         VALUES ($1, lower($2), $3, $4, $5)
         ON CONFLICT (email) DO UPDATE
         SET name = EXCLUDED.name, password_hash = EXCLUDED.password_hash
         RETURNING id",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(phone)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_properties(pool: &PgPool, owner_id: Uuid) -> anyhow::Result<usize> {
    let listings = demo_listings(owner_id);
    let count = listings.len();
    for listing in listings {
        property::insert(pool, listing).await?;
    }
    Ok(count)
}

fn demo_listings(owner_id: Uuid) -> Vec<NewProperty> {
    vec![
        NewProperty {
            owner_id,
            title: "Spacious 2BHK Apartment".to_string(),
            description: "Well-ventilated two-bedroom flat near the city center with a balcony."
                .to_string(),
            location: "Bangalore, Karnataka".to_string(),
            rent: 18000,
            rooms: 2,
            bathrooms: 2,
            area: Some(1100),
            images: vec![
                "https://picsum.photos/800/400?random=11".to_string(),
                "https://picsum.photos/800/400?random=12".to_string(),
            ],
            amenities: vec![
                "Parking".to_string(),
                "24/7 Water".to_string(),
                "Power Backup".to_string(),
                "Lift".to_string(),
            ],
        },
        NewProperty {
            owner_id,
            title: "Villa with Private Garden".to_string(),
            description: "Four-bedroom villa with a garden, terrace and covered parking."
                .to_string(),
            location: "Mysore, Karnataka".to_string(),
            rent: 45000,
            rooms: 4,
            bathrooms: 3,
            area: Some(2600),
            images: vec!["https://picsum.photos/800/400?random=13".to_string()],
            amenities: vec![
                "Swimming Pool".to_string(),
                "Private Garden".to_string(),
                "Gym Access".to_string(),
            ],
        },
        NewProperty {
            owner_id,
            title: "Compact Studio Apartment".to_string(),
            description: "Affordable studio suited to students and working professionals."
                .to_string(),
            location: "Hubli, Karnataka".to_string(),
            rent: 8000,
            rooms: 1,
            bathrooms: 1,
            area: Some(500),
            images: vec!["https://picsum.photos/800/400?random=15".to_string()],
            amenities: vec!["WiFi".to_string(), "Lift Access".to_string()],
        },
        NewProperty {
            owner_id,
            title: "3BHK Duplex with Terrace".to_string(),
            description: "Duplex home with a modular kitchen and a terrace garden.".to_string(),
            location: "Belgaum, Karnataka".to_string(),
            rent: 22000,
            rooms: 3,
            bathrooms: 3,
            area: Some(1800),
            images: vec!["https://picsum.photos/800/400?random=17".to_string()],
            amenities: vec!["Parking".to_string(), "Terrace Garden".to_string()],
        },
    ]
}
