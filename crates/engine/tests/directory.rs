use chrono::NaiveDate;
use sea_orm::Database;

use engine::{
    Engine, EngineError, EntryFilter, EntryKind, EntryStatus, Money, OperationForm, PlanTier,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_owner() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    engine
        .register_owner("alice", PlanTier::Free)
        .await
        .unwrap();
    engine
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, d).unwrap()
}

#[tokio::test]
async fn owners_are_unique_and_carry_a_plan() {
    let engine = engine_with_owner().await;

    assert_eq!(
        engine
            .register_owner("alice", PlanTier::Unlimited)
            .await
            .unwrap_err(),
        EngineError::ExistingKey("alice".to_string())
    );
    assert_eq!(engine.owner_plan("alice").await.unwrap(), PlanTier::Free);

    engine
        .set_owner_plan("alice", PlanTier::Essential)
        .await
        .unwrap();
    assert_eq!(engine.owner_plan("alice").await.unwrap(), PlanTier::Essential);

    assert_eq!(
        engine.owner_plan("nobody").await.unwrap_err(),
        EngineError::KeyNotFound("owner not exists".to_string())
    );
}

#[tokio::test]
async fn account_names_are_unique_per_owner_ignoring_case() {
    let engine = engine_with_owner().await;
    engine
        .register_owner("bob", PlanTier::Free)
        .await
        .unwrap();

    let bank = engine
        .new_account("alice", "  Main   Bank ", "bank", "1000.00".parse().unwrap())
        .await
        .unwrap();
    let account = engine.account("alice", bank).await.unwrap();
    assert_eq!(account.name, "Main Bank");
    assert_eq!(account.balance, account.initial_balance);
    assert_eq!(account.version, 0);

    assert_eq!(
        engine
            .new_account("alice", "main bank", "bank", Money::ZERO)
            .await
            .unwrap_err(),
        EngineError::ExistingKey("main bank".to_string())
    );
    engine
        .new_account("bob", "Main Bank", "bank", Money::ZERO)
        .await
        .unwrap();

    assert!(matches!(
        engine.new_account("alice", "   ", "cash", Money::ZERO).await,
        Err(EngineError::Validation(_))
    ));
    assert_eq!(
        engine
            .new_account("carol", "Cash", "cash", Money::ZERO)
            .await
            .unwrap_err(),
        EngineError::KeyNotFound("owner not exists".to_string())
    );
}

#[tokio::test]
async fn accounts_can_be_listed_renamed_and_deleted() {
    let engine = engine_with_owner().await;
    let cash = engine
        .new_account("alice", "cash drawer", "cash", Money::ZERO)
        .await
        .unwrap();
    let bank = engine
        .new_account("alice", "Bank", "bank", Money::ZERO)
        .await
        .unwrap();

    let names: Vec<_> = engine
        .accounts("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, vec!["Bank", "cash drawer"]);

    assert_eq!(
        engine.rename_account("alice", cash, "BANK").await.unwrap_err(),
        EngineError::ExistingKey("BANK".to_string())
    );
    engine
        .rename_account("alice", cash, "Cash Drawer")
        .await
        .unwrap();
    assert_eq!(engine.account("alice", cash).await.unwrap().name, "Cash Drawer");

    let form = OperationForm::new("Deposit", date(1), EntryKind::Inflow, EntryStatus::Settled)
        .line(bank, Money::new(100));
    engine.create_or_update("alice", &form, &[]).await.unwrap();
    assert!(matches!(
        engine.delete_account("alice", bank).await,
        Err(EngineError::Validation(_))
    ));

    engine.delete_account("alice", cash).await.unwrap();
    assert_eq!(
        engine.account("alice", cash).await.unwrap_err(),
        EngineError::AccountNotFound(cash.to_string())
    );
}

#[tokio::test]
async fn categories_and_counterparties_normalize_names() {
    let engine = engine_with_owner().await;

    let food = engine.new_category("alice", "Café  & Bar").await.unwrap();
    assert_eq!(
        engine.new_category("alice", "cafe bar").await.unwrap_err(),
        EngineError::ExistingKey("cafe bar".to_string())
    );
    engine.new_category("alice", "Rent").await.unwrap();

    let categories = engine.categories("alice").await.unwrap();
    let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Café & Bar", "Rent"]);
    assert_eq!(categories[0].id, food);

    let acme = engine.new_counterparty("alice", "ACME S.p.A.").await.unwrap();
    assert!(matches!(
        engine.new_counterparty("alice", "Acme S.P.A").await,
        Err(EngineError::ExistingKey(_))
    ));
    assert!(matches!(
        engine.new_counterparty("alice", "..").await,
        Err(EngineError::Validation(_))
    ));
    assert_eq!(engine.counterparties("alice").await.unwrap()[0].id, acme);
}

#[tokio::test]
async fn operations_must_reference_known_categories_and_counterparties() {
    let engine = engine_with_owner().await;
    let bank = engine
        .new_account("alice", "Bank", "bank", Money::ZERO)
        .await
        .unwrap();
    let rent = engine.new_category("alice", "Rent").await.unwrap();
    let landlord = engine.new_counterparty("alice", "Landlord").await.unwrap();

    let unknown_category = OperationForm::new("Rent", date(2), EntryKind::Outflow, EntryStatus::Settled)
        .category(Uuid::new_v4())
        .line(bank, Money::new(500_00));
    assert_eq!(
        engine
            .create_or_update("alice", &unknown_category, &[])
            .await
            .unwrap_err(),
        EngineError::KeyNotFound("category not exists".to_string())
    );

    let unknown_counterparty =
        OperationForm::new("Rent", date(2), EntryKind::Outflow, EntryStatus::Settled)
            .counterparty(Uuid::new_v4())
            .line(bank, Money::new(500_00));
    assert_eq!(
        engine
            .create_or_update("alice", &unknown_counterparty, &[])
            .await
            .unwrap_err(),
        EngineError::KeyNotFound("counterparty not exists".to_string())
    );
    assert_eq!(engine.account("alice", bank).await.unwrap().balance, Money::ZERO);

    let form = OperationForm::new("Rent", date(2), EntryKind::Outflow, EntryStatus::Settled)
        .category(rent)
        .counterparty(landlord)
        .fiscal_document(true)
        .line(bank, Money::new(500_00));
    engine.create_or_update("alice", &form, &[]).await.unwrap();
    let other = OperationForm::new("Coffee", date(3), EntryKind::Outflow, EntryStatus::Settled)
        .line(bank, Money::new(1_50));
    engine.create_or_update("alice", &other, &[]).await.unwrap();

    let filter = EntryFilter {
        counterparty_id: Some(landlord),
        fiscal_document: Some(true),
        kind: Some(EntryKind::Outflow),
        ..EntryFilter::default()
    };
    let views = engine.list_operations("alice", &filter).await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].category_id, Some(rent));
    assert_eq!(views[0].counterparty_id, Some(landlord));
    assert_eq!(views[0].fiscal_document, Some(true));
    assert_eq!(views[0].signed_total(), Money::new(-500_00));
}
