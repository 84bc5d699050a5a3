use chrono::Duration;
use classifieds_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    middleware::auth::{AuthUser, ROLE_SUPERUSER, ROLE_USER, encode_token},
    models::AdStatus,
    policy::Visibility,
    store::{
        AdvertisementFilter, AdvertisementStore, NewAdvertisement, NewUser, PageWindow,
        PostgresStore, Store, UserStore,
    },
};
use uuid::Uuid;

const DEMO_USERS: [(&str, &str, &str, &str); 3] = [
    ("alice", "Alice", "Smith", ROLE_USER),
    ("bob", "Bob", "Jones", ROLE_USER),
    ("admin", "Site", "Admin", ROLE_SUPERUSER),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let store = PostgresStore::new(orm);

    let mut alice = None;
    for (username, first_name, last_name, role) in DEMO_USERS {
        let user = store
            .upsert_user(NewUser {
                id: Uuid::new_v5(&Uuid::NAMESPACE_OID, username.as_bytes()),
                username: username.to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                role: role.to_string(),
            })
            .await?;

        let token = encode_token(
            &config.jwt_secret,
            &AuthUser {
                user_id: user.id,
                username: user.username.clone(),
                role: role.to_string(),
            },
            Duration::days(30),
        )?;
        println!("{username} ({role}) id={} token=Bearer {token}", user.id);

        if username == "alice" {
            alice = Some(user.id);
        }
    }

    let alice = alice.ok_or_else(|| anyhow::anyhow!("alice was not seeded"))?;
    seed_advertisements(&store, alice).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_advertisements(store: &dyn Store, creator_id: Uuid) -> anyhow::Result<()> {
    let existing = store
        .list_advertisements(
            Visibility::Everything,
            &AdvertisementFilter {
                creator: Some("alice".into()),
                ..Default::default()
            },
            &PageWindow::default(),
        )
        .await?;
    if existing.total > 0 {
        println!("Advertisements already seeded");
        return Ok(());
    }

    let advertisements = [
        ("Road bike", "Aluminium frame, 54 cm", AdStatus::Open),
        ("Bookshelf", "Pine, five shelves", AdStatus::Open),
        ("Sofa", "Still deciding on the price", AdStatus::Draft),
        ("Desk lamp", "Sold last week", AdStatus::Closed),
    ];

    for (title, description, status) in advertisements {
        store
            .insert_advertisement(NewAdvertisement {
                title: title.to_string(),
                description: description.to_string(),
                status,
                creator_id,
            })
            .await?;
    }

    println!("Seeded advertisements");
    Ok(())
}
