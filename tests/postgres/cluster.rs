//! Database provisioning for the `PostgreSQL` integration tests.
//!
//! `SPRINTBOARD_TEST_DATABASE_URL` points the tests at an existing server.
//! Without it an embedded cluster is bootstrapped once per test binary. When
//! neither is available the tests fail rather than pass without running.

use super::helpers::{BoxError, DATABASE_URL_ENV};
use crate::test_helpers::EnvVarGuard;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use pg_embedded_setup_unpriv::worker_process_test_api::{
    WorkerOperation, WorkerRequest, WorkerRequestArgs, run as run_worker,
};
use pg_embedded_setup_unpriv::{ExecutionPrivileges, TestBootstrapSettings, bootstrap_for_tests};
use postgresql_embedded::{PostgreSQL, Settings, Status};
use std::ffi::{OsStr, OsString};
use std::net::TcpListener;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::runtime::Runtime;

const TEST_DATABASE: &str = "sprintboard_test";

static TEST_DATABASE_HANDLE: OnceLock<TestDatabase> = OnceLock::new();

enum TestDatabase {
    External(String),
    Embedded {
        url: String,
        _cluster: EmbeddedCluster,
    },
}

impl TestDatabase {
    fn url(&self) -> &str {
        match self {
            Self::External(url) | Self::Embedded { url, .. } => url,
        }
    }
}

/// Returns the URL of the database the tests run against, starting the
/// embedded cluster on first use.
///
/// # Panics
///
/// Panics when no external database is configured and the embedded cluster
/// cannot be started.
pub fn database_url() -> &'static str {
    TEST_DATABASE_HANDLE
        .get_or_init(|| {
            if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
                return TestDatabase::External(url);
            }
            match EmbeddedCluster::start().and_then(EmbeddedCluster::into_test_database) {
                Ok(database) => database,
                Err(err) => panic!(
                    "failed to start embedded PostgreSQL ({err}); \
                     set {DATABASE_URL_ENV} to use an existing server"
                ),
            }
        })
        .url()
}

/// Embedded cluster kept alive for the lifetime of the test binary.
struct EmbeddedCluster {
    settings: Settings,
    _runtime: Option<Runtime>,
    _postgres: Option<PostgreSQL>,
}

impl EmbeddedCluster {
    fn start() -> Result<Self, BoxError> {
        let port_guard = EnvVarGuard::set_many(&port_override()?);
        let bootstrap = bootstrap_for_tests();
        drop(port_guard);
        let mut bootstrap = bootstrap.map_err(|err| Box::new(err) as BoxError)?;
        sync_password_from_file(&mut bootstrap.settings)?;
        match bootstrap.privileges {
            ExecutionPrivileges::Unprivileged => Self::start_in_process(bootstrap),
            ExecutionPrivileges::Root => Self::start_via_worker(bootstrap),
        }
    }

    fn start_in_process(bootstrap: TestBootstrapSettings) -> Result<Self, BoxError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let env_guard = EnvVarGuard::set_many(&env_vars_to_os(&bootstrap.environment.to_env()));
        let mut postgres = PostgreSQL::new(bootstrap.settings);
        let started = runtime.block_on(async {
            postgres
                .setup()
                .await
                .map_err(|err| Box::new(err) as BoxError)?;
            if !matches!(postgres.status(), Status::Started) {
                postgres
                    .start()
                    .await
                    .map_err(|err| Box::new(err) as BoxError)?;
            }
            Ok::<(), BoxError>(())
        });
        drop(env_guard);
        started?;

        let mut settings = postgres.settings().clone();
        sync_port_from_pid(&mut settings)?;
        Ok(Self {
            settings,
            _runtime: Some(runtime),
            _postgres: Some(postgres),
        })
    }

    fn start_via_worker(bootstrap: TestBootstrapSettings) -> Result<Self, BoxError> {
        let worker = bootstrap.worker_binary.as_ref().ok_or_else(|| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "running as root needs PG_EMBEDDED_WORKER to name a worker binary",
            )) as BoxError
        })?;
        let env_vars = bootstrap.environment.to_env();
        let run = |operation: WorkerOperation, timeout: Duration| {
            let args = WorkerRequestArgs {
                worker: worker.as_path(),
                settings: &bootstrap.settings,
                env_vars: &env_vars,
                operation,
                timeout,
            };
            run_worker(&WorkerRequest::new(args)).map_err(|err| Box::new(err) as BoxError)
        };
        run(WorkerOperation::Setup, bootstrap.setup_timeout)?;
        run(WorkerOperation::Start, bootstrap.start_timeout)?;

        let mut settings = bootstrap.settings.clone();
        sync_port_from_pid(&mut settings)?;
        Ok(Self {
            settings,
            _runtime: None,
            _postgres: None,
        })
    }

    fn into_test_database(self) -> Result<TestDatabase, BoxError> {
        self.ensure_database(TEST_DATABASE)?;
        Ok(TestDatabase::Embedded {
            url: self.settings.url(TEST_DATABASE),
            _cluster: self,
        })
    }

    fn ensure_database(&self, name: &str) -> Result<(), BoxError> {
        #[derive(diesel::QueryableByName)]
        struct ExistsRow {
            #[diesel(sql_type = Bool)]
            exists: bool,
        }

        let mut admin = PgConnection::establish(&self.settings.url("postgres"))?;
        let row = diesel::sql_query(
            "SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1) AS exists",
        )
        .bind::<Text, _>(name)
        .get_result::<ExistsRow>(&mut admin)?;
        if !row.exists {
            diesel::sql_query(format!("CREATE DATABASE \"{}\"", name.replace('"', "\"\"")))
                .execute(&mut admin)?;
        }
        Ok(())
    }
}

/// Picks a free port for the cluster unless `PG_PORT` is already set.
fn port_override() -> Result<Vec<(OsString, Option<OsString>)>, BoxError> {
    if std::env::var_os("PG_PORT").is_some() {
        return Ok(Vec::new());
    }
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(vec![(
        OsString::from("PG_PORT"),
        Some(OsString::from(port.to_string())),
    )])
}

fn env_vars_to_os(env_vars: &[(String, Option<String>)]) -> Vec<(OsString, Option<OsString>)> {
    env_vars
        .iter()
        .map(|(key, value)| (OsString::from(key), value.as_ref().map(OsString::from)))
        .collect()
}

fn sync_password_from_file(settings: &mut Settings) -> Result<(), BoxError> {
    let (dir, file_name) = open_parent_dir(&settings.password_file)?;
    match dir.read_to_string(file_name) {
        Ok(contents) => {
            let password = contents.trim_end();
            if !password.is_empty() {
                password.clone_into(&mut settings.password);
            }
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Box::new(err) as BoxError),
    }
}

/// The fourth line of `postmaster.pid` holds the port the server bound.
fn sync_port_from_pid(settings: &mut Settings) -> Result<(), BoxError> {
    let data_dir = Dir::open_ambient_dir(&settings.data_dir, ambient_authority())?;
    let contents = match data_dir.read_to_string("postmaster.pid") {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(Box::new(err) as BoxError),
    };
    if let Some(port) = contents
        .lines()
        .nth(3)
        .and_then(|line| line.trim().parse::<u16>().ok())
    {
        settings.port = port;
    }
    Ok(())
}

fn open_parent_dir(path: &Path) -> Result<(Dir, &OsStr), BoxError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::other("path must include a file name"))?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}
