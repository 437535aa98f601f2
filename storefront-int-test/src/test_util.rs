use storefront::collection::{CollectionName, Document};
use storefront::config::DataConfig;
use storefront::errors::{ErrorKind, StorefrontError, StorefrontResult};
use storefront::source::{DataSource, DocumentStoreSource, SnapshotSource};
use storefront::{DataContext, DataMode};
use std::backtrace::Backtrace;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use std::{env, fs, thread};

pub const PRODUCTS_FIXTURE: &str = r#"[
  {"id":"prod_001","name":"Rust in Action","category":"Books","price":9.99,"stock":12,"created_at":"2024-01-01T09:00:00.000Z","updated_at":"2024-01-01T09:00:00.000Z"},
  {"id":"prod_002","name":"Programming Rust","category":"Books","price":19.99,"stock":3,"created_at":"2024-01-03T09:00:00.000Z","updated_at":"2024-01-03T09:00:00.000Z"},
  {"id":"prod_003","name":"Mechanical Keyboard","category":"Electronics","price":89.5,"stock":0,"created_at":"2024-01-02T09:00:00.000Z","updated_at":"2024-01-02T09:00:00.000Z"},
  {"id":"prod_004","name":"Puzzle Cube","category":"Toys","price":7.25,"stock":40,"created_at":"2024-01-04T09:00:00.000Z","updated_at":"2024-01-04T09:00:00.000Z"}
]"#;

pub const CUSTOMERS_FIXTURE: &str = r#"{"customers":[
  {"id":"cust_001","email":"ada@example.com","name":"Ada","tier":"gold","created_at":"2024-02-01T10:00:00.000Z","updated_at":"2024-02-01T10:00:00.000Z"},
  {"id":"cust_002","email":"grace@example.com","name":"Grace","tier":"silver","created_at":"2024-02-02T10:00:00.000Z","updated_at":"2024-02-02T10:00:00.000Z"}
]}"#;

pub const REVIEWS_FIXTURE: &str = r#"[
  {"id":"revi_001","product_id":"prod_001","customer_id":"cust_001","rating":5},
  {"reviews":[
    {"id":"revi_002","product_id":"prod_002","customer_id":"cust_002","rating":4},
    {"id":"revi_003","product_id":"prod_001","customer_id":"cust_002","rating":3}
  ]}
]"#;

pub const FAQ_FIXTURE: &str = r#"{"question":"Do you ship abroad?","answer":"Yes"}"#;

/// Runs a test with retry logic and error handling.
/// `after` runs whether or not the test succeeded.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> StorefrontResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> StorefrontResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> StorefrontResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 2;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx)
                        .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();
        let failure = match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => (e, bt),
            Err(panic_err) => {
                let msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                (format!("Panic: {}", msg), Backtrace::capture().to_string())
            }
        };

        if attempt < MAX_RETRIES {
            eprintln!(
                "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                attempt, MAX_RETRIES, elapsed
            );
            eprintln!("{}", failure.0);
            thread::sleep(Duration::from_millis(50 * attempt as u64));
        }
        last_error = Some(failure.0);
        last_backtrace = Some(failure.1);
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

/// A scratch root with a `mock-data` fixture directory and a `db`
/// directory, plus a [DataContext] over them.
#[derive(Clone)]
pub struct TestContext {
    root: PathBuf,
    context: DataContext,
}

impl TestContext {
    pub fn new(root: PathBuf, context: DataContext) -> Self {
        Self { root, context }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fixtures_dir(&self) -> PathBuf {
        self.root.join("mock-data")
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("db")
    }

    pub fn context(&self) -> DataContext {
        self.context.clone()
    }

    /// Writes `<collection>.json` into the fixture directory.
    pub fn write_fixture(&self, collection: CollectionName, json: &str) -> StorefrontResult<()> {
        write_fixture(&self.fixtures_dir(), collection, json)
    }

    /// A fresh context over the same directories, starting in `mode`.
    pub fn reopen(&self, mode: DataMode) -> DataContext {
        DataContext::new(config(&self.root, mode))
    }

    /// The document store backend for `collection`, whatever the mode.
    pub fn document_source(&self, collection: CollectionName) -> Arc<dyn DataSource> {
        Arc::new(DocumentStoreSource::new(
            self.context.document_store().clone(),
            collection,
        ))
    }

    /// The snapshot backend for `collection`, whatever the mode.
    pub fn snapshot_source(&self, collection: CollectionName) -> Arc<SnapshotSource> {
        self.context.snapshot(collection)
    }
}

pub fn random_path() -> PathBuf {
    env::temp_dir().join(format!("storefront-{}", uuid::Uuid::new_v4()))
}

fn config(root: &Path, mode: DataMode) -> DataConfig {
    DataConfig::builder()
        .db_path(root.join("db"))
        .fixtures_dir(root.join("mock-data"))
        .use_document_store(mode == DataMode::DocumentStore)
        .build()
}

fn write_fixture(dir: &Path, collection: CollectionName, json: &str) -> StorefrontResult<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(format!("{}.json", collection)), json)?;
    Ok(())
}

fn create_context(mode: DataMode) -> StorefrontResult<TestContext> {
    let root = random_path();
    if root.exists() {
        return Err(StorefrontError::new(
            &format!("Scratch directory {} already exists", root.display()),
            ErrorKind::InternalError,
        ));
    }

    let fixtures = root.join("mock-data");
    write_fixture(&fixtures, CollectionName::Products, PRODUCTS_FIXTURE)?;
    write_fixture(&fixtures, CollectionName::Customers, CUSTOMERS_FIXTURE)?;
    write_fixture(&fixtures, CollectionName::Reviews, REVIEWS_FIXTURE)?;
    write_fixture(&fixtures, CollectionName::Faq, FAQ_FIXTURE)?;

    let context = DataContext::new(config(&root, mode));
    Ok(TestContext::new(root, context))
}

/// Standard fixtures, document store mode.
pub fn create_test_context() -> StorefrontResult<TestContext> {
    create_context(DataMode::DocumentStore)
}

/// Standard fixtures, snapshot mode.
pub fn create_snapshot_test_context() -> StorefrontResult<TestContext> {
    create_context(DataMode::Snapshot)
}

pub fn cleanup(ctx: TestContext) -> StorefrontResult<()> {
    if let Err(e) = ctx.context().document_store().drop_all_files() {
        eprintln!("Warning: Failed to drop collection files: {:?}", e);
    }
    match fs::remove_dir_all(ctx.root()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Ids of `docs`, in order.
pub fn ids(docs: &[Document]) -> Vec<String> {
    docs.iter()
        .filter_map(|doc| doc.id().map(str::to_string))
        .collect()
}
