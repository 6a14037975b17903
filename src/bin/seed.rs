//! Seeds a fresh database with the default accounts, the service catalog
//! and a few customers. Safe to re-run; existing rows are left alone.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use laundry_api::{
    auth::{AuthConfig, AuthService},
    config, db,
    entities::{customer, service, user},
    models::{Role, ServiceType},
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tracing::info;
use uuid::Uuid;

struct SeedService {
    name: &'static str,
    service_type: ServiceType,
    price: i64,
    estimated_hours: i32,
}

const SERVICES: &[SeedService] = &[
    SeedService { name: "Cuci Kering Lipat", service_type: ServiceType::Kiloan, price: 7000, estimated_hours: 48 },
    SeedService { name: "Cuci Setrika", service_type: ServiceType::Kiloan, price: 10000, estimated_hours: 72 },
    SeedService { name: "Setrika Saja", service_type: ServiceType::Kiloan, price: 5000, estimated_hours: 24 },
    SeedService { name: "Cuci Express", service_type: ServiceType::Kiloan, price: 15000, estimated_hours: 12 },
    SeedService { name: "Dry Clean Jas", service_type: ServiceType::Satuan, price: 35000, estimated_hours: 72 },
    SeedService { name: "Dry Clean Gaun", service_type: ServiceType::Satuan, price: 45000, estimated_hours: 72 },
    SeedService { name: "Cuci Selimut", service_type: ServiceType::Satuan, price: 25000, estimated_hours: 48 },
    SeedService { name: "Cuci Bed Cover", service_type: ServiceType::Satuan, price: 30000, estimated_hours: 48 },
    SeedService { name: "Cuci Karpet Kecil", service_type: ServiceType::Satuan, price: 20000, estimated_hours: 72 },
    SeedService { name: "Cuci Karpet Besar", service_type: ServiceType::Satuan, price: 50000, estimated_hours: 96 },
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Budi Santoso", "081234567890"),
    ("Siti Rahayu", "081298765432"),
    ("Agus Wijaya", "085612345678"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_config()?;
    config::init_tracing(app_config.log_level(), app_config.log_json);

    let db_pool = Arc::new(db::establish_connection_from_app_config(&app_config).await?);
    db::run_migrations(&db_pool).await?;

    let auth = AuthService::new(
        AuthConfig::new(
            app_config.jwt_secret.clone(),
            Duration::from_secs(app_config.jwt_expiration as u64),
        ),
        db_pool.clone(),
    );

    seed_user(&db_pool, &auth, "owner", "owner123", "Pemilik Laundry", Role::Owner).await?;
    seed_user(&db_pool, &auth, "kasir", "kasir123", "Kasir Satu", Role::Kasir).await?;

    for seed in SERVICES {
        let exists = service::Entity::find()
            .filter(service::Column::Name.eq(seed.name))
            .count(&*db_pool)
            .await?
            > 0;
        if exists {
            continue;
        }

        let now = Utc::now();
        service::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(seed.name.to_string()),
            service_type: Set(seed.service_type.to_string()),
            price: Set(Decimal::from(seed.price)),
            estimated_hours: Set(seed.estimated_hours),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*db_pool)
        .await?;
        info!(name = seed.name, "Seeded service");
    }

    for (name, phone) in CUSTOMERS {
        let exists = customer::Entity::find()
            .filter(customer::Column::Phone.eq(*phone))
            .count(&*db_pool)
            .await?
            > 0;
        if exists {
            continue;
        }

        let now = Utc::now();
        customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            phone: Set(Some(phone.to_string())),
            address: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*db_pool)
        .await?;
        info!(name = name, "Seeded customer");
    }

    info!("Seeding complete");
    Ok(())
}

async fn seed_user(
    db_pool: &Arc<db::DbPool>,
    auth: &AuthService,
    username: &str,
    password: &str,
    name: &str,
    role: Role,
) -> anyhow::Result<()> {
    let exists = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .count(&**db_pool)
        .await?
        > 0;
    if exists {
        return Ok(());
    }

    let now = Utc::now();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        password_hash: Set(auth.hash_password(password)?),
        name: Set(name.to_string()),
        email: Set(None),
        role: Set(role.to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&**db_pool)
    .await?;

    info!(username = username, role = %role, "Seeded user");
    Ok(())
}
