// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Scoped transaction handling.
//!
//! [`TransactionGuard`] opens a transaction on construction and rolls it
//! back when dropped unless [`TransactionGuard::commit`] was called. Any
//! early return (`?`, panic unwinding) therefore leaves the store unchanged.

use diesel::Connection;
use diesel::connection::TransactionManager;
use tracing::{debug, error, warn};

use crate::backend::PersistenceBackend;
use crate::error::PersistenceError;

type Manager<C> = <C as Connection>::TransactionManager;

/// An open transaction on a borrowed connection.
pub struct TransactionGuard<'a, C: Connection> {
    conn: &'a mut C,
    open: bool,
}

impl<'a, C: Connection> TransactionGuard<'a, C> {
    /// Begins a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionFailure` with operation `begin_transaction` if the
    /// store refuses to open one.
    pub fn begin(conn: &'a mut C) -> Result<Self, PersistenceError> {
        <Manager<C> as TransactionManager<C>>::begin_transaction(conn)
            .map_err(|e| PersistenceError::transaction("begin_transaction", &e))?;
        debug!("Transaction started");
        Ok(Self { conn, open: true })
    }

    /// Returns the connection the transaction runs on.
    pub fn connection(&mut self) -> &mut C {
        self.conn
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionFailure` with operation `commit_transaction`.
    pub fn commit(mut self) -> Result<(), PersistenceError> {
        self.open = false;
        <Manager<C> as TransactionManager<C>>::commit_transaction(&mut *self.conn)
            .map_err(|e| PersistenceError::transaction("commit_transaction", &e))?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Returns `TransactionFailure` with operation `rollback_transaction`.
    pub fn rollback(mut self) -> Result<(), PersistenceError> {
        self.open = false;
        <Manager<C> as TransactionManager<C>>::rollback_transaction(&mut *self.conn)
            .map_err(|e| PersistenceError::transaction("rollback_transaction", &e))?;
        debug!("Transaction rolled back");
        Ok(())
    }

    /// Rolls back after `cause` aborted the transaction.
    ///
    /// Returns `cause` when the rollback succeeds. If the rollback itself
    /// fails, the rollback failure is returned and its reason names the
    /// original cause as well.
    pub fn abort(self, cause: PersistenceError) -> PersistenceError {
        match self.rollback() {
            Ok(()) => cause,
            Err(PersistenceError::TransactionFailure { operation, reason }) => {
                PersistenceError::TransactionFailure {
                    operation,
                    reason: format!("{reason} (while aborting after: {cause})"),
                }
            }
            Err(other) => other,
        }
    }
}

impl<'a, C: PersistenceBackend> TransactionGuard<'a, C> {
    /// Begins a transaction through
    /// [`PersistenceBackend::begin_write_transaction`].
    ///
    /// On `SQLite` the write lock is taken here rather than at the first
    /// write, waiting up to the connection's busy timeout for it.
    ///
    /// # Errors
    ///
    /// Returns `TransactionFailure` with operation `begin_transaction`.
    pub fn begin_write(conn: &'a mut C) -> Result<Self, PersistenceError> {
        conn.begin_write_transaction()
            .map_err(|e| PersistenceError::transaction("begin_transaction", &e))?;
        debug!(dialect = C::DIALECT.as_str(), "Write transaction started");
        Ok(Self { conn, open: true })
    }
}

impl<C: Connection> Drop for TransactionGuard<'_, C> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }

        match <Manager<C> as TransactionManager<C>>::rollback_transaction(&mut *self.conn) {
            Ok(()) => warn!("Transaction dropped without commit; rolled back"),
            Err(e) => error!(error = %e, "Failed to roll back dropped transaction"),
        }
    }
}
