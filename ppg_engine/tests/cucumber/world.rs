use std::collections::HashMap;

use cucumber::World;
use log::*;
use ppg_engine::{
    db_types::{PaymentIntent, Reference},
    events::EventProducers,
    test_utils::{
        fake_processor::FakeProcessor,
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    CheckoutApi,
    CheckoutOptions,
    IntentApi,
    ReconciliationApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct PaymentWorld {
    pub system: Option<PaymentSystem>,
    /// Scenario aliases for generated references, e.g. `[order1]`
    pub references: HashMap<String, Reference>,
    pub trust_claimed_status: bool,
    pub last_outcome: Option<String>,
}

#[derive(Debug)]
pub struct PaymentSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub processor: FakeProcessor,
    pub checkout: CheckoutApi<SqliteDatabase, FakeProcessor>,
    pub reconciliation: ReconciliationApi<SqliteDatabase, FakeProcessor>,
    pub intents: IntentApi<SqliteDatabase>,
}

impl PaymentWorld {
    pub fn system(&self) -> &PaymentSystem {
        self.system.as_ref().expect("Payment system not initialised")
    }

    pub fn reference(&self, alias: &str) -> Reference {
        self.references.get(alias).cloned().unwrap_or_else(|| panic!("No reference has the alias [{alias}]"))
    }

    pub async fn intent(&self, alias: &str) -> PaymentIntent {
        let reference = self.reference(alias);
        self.system().intents.intent(&reference).await.expect("Error fetching intent").expect("Intent does not exist")
    }
}

impl PaymentSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        create_database(&db_path).await;
        run_migrations(&db_path).await;
        let db = SqliteDatabase::new_with_url(&db_path, 5).await.expect("Error creating connection to database");
        debug!("Created database: {db_path}");
        let processor = FakeProcessor::new();
        let producers = EventProducers::default();
        let options = CheckoutOptions::new("https://plans.example.com");
        let checkout = CheckoutApi::new(db.clone(), processor.clone(), options, producers.clone());
        let reconciliation = ReconciliationApi::new(db.clone(), processor.clone(), producers);
        let intents = IntentApi::new(db.clone());
        Self { db_path, db, processor, checkout, reconciliation, intents }
    }
}
