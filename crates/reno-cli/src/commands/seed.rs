//! Demo data for local development
//!
//! Re-running is safe: users are keyed by email and contractors by company
//! name.

use anyhow::Result;
use reno_config::Config;
use reno_core::{Contractor, MarketStore, Role, User};
use reno_storage::Storage;
use tracing::info;

const USERS: &[(&str, &str, Role)] = &[
    ("Jan van der Berg", "jan@renovibez.nl", Role::Consumer),
    ("Maria Jansen", "maria@renovibez.nl", Role::Consumer),
    ("Piet Bakker", "piet@renovatiepro.nl", Role::Contractor),
    ("Kees de Vries", "kees@devakman.nl", Role::Contractor),
];

struct DemoContractor {
    company_name: &'static str,
    city: &'static str,
    rating: f64,
    review_count: i64,
    specialties: &'static [&'static str],
    /// Email of the contractor user who owns the profile
    owner: Option<&'static str>,
}

const CONTRACTORS: &[DemoContractor] = &[
    DemoContractor {
        company_name: "Renovatie Pro Zwolle",
        city: "Zwolle",
        rating: 4.8,
        review_count: 23,
        specialties: &["Badkamer", "Keuken", "Algemeen"],
        owner: Some("piet@renovatiepro.nl"),
    },
    DemoContractor {
        company_name: "Bouwbedrijf De Vakman",
        city: "Deventer",
        rating: 4.9,
        review_count: 18,
        specialties: &["Badkamer", "Slaapkamer", "Loodgieterwerk"],
        owner: Some("kees@devakman.nl"),
    },
    DemoContractor {
        company_name: "Keuken & Interieur Enschede",
        city: "Enschede",
        rating: 4.6,
        review_count: 31,
        specialties: &["Keuken", "Woonkamer", "Afwerking"],
        owner: None,
    },
    DemoContractor {
        company_name: "Totaal Renovatie Almelo",
        city: "Almelo",
        rating: 4.7,
        review_count: 42,
        specialties: &["Woonkamer", "Slaapkamer", "Algemeen"],
        owner: None,
    },
    DemoContractor {
        company_name: "Eco Bouw Kampen",
        city: "Kampen",
        rating: 4.5,
        review_count: 27,
        specialties: &["Duurzaam", "Buitenruimte", "Isolatie"],
        owner: None,
    },
    DemoContractor {
        company_name: "Thuiskantoor Experts Hengelo",
        city: "Hengelo",
        rating: 4.8,
        review_count: 15,
        specialties: &["Thuiskantoor", "Elektra", "Interieur"],
        owner: None,
    },
];

pub async fn handle(config: &Config) -> Result<()> {
    let storage = Storage::new(config.database.path.clone()).await?;
    seed(&storage).await?;
    Ok(())
}

async fn seed(store: &dyn MarketStore) -> Result<Vec<Contractor>> {
    let mut users = Vec::with_capacity(USERS.len());
    for &(name, email, role) in USERS {
        let user = store
            .upsert_user(&User::new(name.to_string(), email.to_string(), role))
            .await?;
        println!(
            "✓ {} {} ({})",
            role.as_str().to_lowercase(),
            user.name,
            user.email
        );
        users.push(user);
    }

    let mut contractors = Vec::with_capacity(CONTRACTORS.len());
    for demo in CONTRACTORS {
        let mut contractor =
            Contractor::new(demo.company_name.to_string(), demo.city.to_string());
        contractor.rating = demo.rating;
        contractor.review_count = demo.review_count;
        contractor.specialties = demo.specialties.iter().map(|s| s.to_string()).collect();
        contractor.verified = true;
        contractor.user_id = demo
            .owner
            .and_then(|email| users.iter().find(|u| u.email == email))
            .map(|u| u.id.clone());

        let linked = contractor.user_id.is_some();
        let saved = store.upsert_contractor(&contractor).await?;
        println!(
            "✓ contractor {}{}",
            saved.company_name,
            if linked { " (linked to user)" } else { "" }
        );
        contractors.push(saved);
    }

    info!(
        users = USERS.len(),
        contractors = CONTRACTORS.len(),
        "demo data seeded"
    );
    Ok(contractors)
}
