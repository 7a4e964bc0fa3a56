//! Populate a database with an admin account and random signatures.
//!
//! `PETITION_ADMIN_USERNAME` + `PETITION_ADMIN_PASSWORD` create (or reset) the
//! admin; `PETITION_SEED_SIGNATURES` sets how many fake entries to add.

use std::collections::HashSet;
use std::env;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::info;

use petition_api::auth::hash_password;
use petition_db::Database;
use petition_server::config::try_load;
use petition_types::models::NewSignature;

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed",
    "do", "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna",
    "aliqua", "enim", "ad", "minim", "veniam", "quis", "nostrud", "exercitation",
];

/// Seeded rows are spread over the last two weeks.
const SPREAD_MS: i64 = 14 * 24 * 60 * 60 * 1000;

fn sentence(rng: &mut impl Rng) -> String {
    let len = rng.random_range(3..=8);
    let words: Vec<&str> = (0..len).map(|_| WORDS[rng.random_range(0..WORDS.len())]).collect();
    let mut out = words.join(" ");
    if let Some(first) = out.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    out.push('.');
    out
}

fn fake_signatures(count: usize, now: DateTime<Utc>) -> Vec<(NewSignature, DateTime<Utc>)> {
    let mut rng = rand::rng();
    let mut seen = HashSet::with_capacity(count);

    let mut rows = Vec::with_capacity(count);
    while rows.len() < count {
        let national_id = format!("{:010}", rng.random_range(0..=9_999_999_999u64));
        if !seen.insert(national_id.clone()) {
            continue;
        }

        let name = if rng.random_bool(0.5) { sentence(&mut rng) } else { String::new() };
        let comment = if rng.random_bool(0.5) { sentence(&mut rng) } else { String::new() };
        let signed = now - Duration::milliseconds(rng.random_range(0..=SPREAD_MS));

        rows.push((
            NewSignature {
                name,
                national_id,
                comment,
                anonymous: rng.random_bool(0.5),
            },
            signed,
        ));
    }
    rows
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "petition_seed=info,petition_db=info".into()),
        )
        .init();

    let db_path: std::path::PathBuf = try_load("PETITION_DB_PATH", "petition.db")?;
    let db = Database::open(&db_path)?;

    match (
        env::var("PETITION_ADMIN_USERNAME"),
        env::var("PETITION_ADMIN_PASSWORD"),
    ) {
        (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
            let id = db.upsert_user(&username, &hash_password(&password)?)?;
            info!("Admin user '{}' ready (id {})", username, id);
        }
        _ => info!("PETITION_ADMIN_USERNAME/PASSWORD not set, skipping admin user"),
    }

    let count: usize = try_load("PETITION_SEED_SIGNATURES", "0")?;
    if count > 0 {
        let inserted = db.insert_signatures_at(&fake_signatures(count, Utc::now()))?;
        info!("Inserted {} signatures", inserted);
    }

    Ok(())
}
