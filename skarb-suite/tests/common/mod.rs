#![allow(dead_code)]

//! Common test utilities for scenario tests
//!
//! This module provides shared infrastructure:
//! - Scratch database setup with the fixture schema
//! - A database-backed application driver
//!
//! Tests need `DATABASE_URL`; without it they return early with a notice.

use skarb_suite::app::DirectApplication;
use skarb_verify::db::migrations::{ensure_database_exists, run_migrations};
use skarb_verify::{ConnectionConfig, DbSession};
use std::env;
use std::sync::Arc;

/// Test context containing all necessary resources
pub struct TestContext {
    pub session: Arc<DbSession>,
    pub app: DirectApplication,
}

impl TestContext {
    /// Creates a context on a migrated scratch database
    ///
    /// Returns `Ok(None)` when `DATABASE_URL` is not set.
    pub async fn new() -> anyhow::Result<Option<Self>> {
        dotenvy::dotenv().ok();
        let Ok(url) = env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping scenario test");
            return Ok(None);
        };

        ensure_database_exists(&url).await?;

        let session = DbSession::connect(ConnectionConfig {
            url,
            ..Default::default()
        })
        .await?;

        {
            let mut conn = session.connection().await?;
            run_migrations(&mut conn).await?;
        }

        let session = Arc::new(session);
        Ok(Some(Self {
            app: DirectApplication::new(session.clone()),
            session,
        }))
    }

    /// Closes the database session
    pub async fn cleanup(self) -> anyhow::Result<()> {
        self.session.close().await?;
        Ok(())
    }
}
