// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Where the harness server listens.

use crate::errors::PortSelectionError;
use std::{
    net::{Ipv4Addr, TcpListener},
    sync::OnceLock,
};
use tracing::debug;

/// The location of the harness server that the test host posts events to.
///
/// The port is chosen lazily, the first time it's needed: starting at the default port, each
/// port is tried in turn until one can be bound.
#[derive(Debug)]
pub struct ServerLocation {
    default_port: u16,
    port: OnceLock<u16>,
}

impl ServerLocation {
    /// The port tried first if none is configured.
    pub const DEFAULT_PORT: u16 = 8887;

    /// The path of the page that hosts the tests, relative to the base URL.
    pub const TEST_PAGE_PATH: &'static str = "GetHtmlTestPage";

    /// Creates a new location that starts looking for a free port at `default_port`.
    pub fn new(default_port: u16) -> Self {
        Self {
            default_port,
            port: OnceLock::new(),
        }
    }

    /// Returns the selected port, selecting one if that hasn't happened yet.
    pub fn port(&self) -> Result<u16, PortSelectionError> {
        if let Some(port) = self.port.get() {
            return Ok(*port);
        }
        let port = find_unused_port(self.default_port)?;
        // If another thread won the race, use its port so that all callers agree.
        Ok(*self.port.get_or_init(|| port))
    }

    /// Returns the base URL of the server: `http://localhost:{port}/`.
    pub fn base_url(&self) -> Result<String, PortSelectionError> {
        Ok(format!("http://localhost:{}/", self.port()?))
    }

    /// Returns the URL of the page that hosts the tests.
    pub fn test_page_url(&self) -> Result<String, PortSelectionError> {
        Ok(self.base_url()? + Self::TEST_PAGE_PATH)
    }
}

impl Default for ServerLocation {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PORT)
    }
}

/// Returns the first port at or above `start` that can be bound on localhost.
pub fn find_unused_port(start: u16) -> Result<u16, PortSelectionError> {
    let mut last_error = None;
    for port in start..=u16::MAX {
        debug!("attempting to open port {port}");
        match TcpListener::bind((Ipv4Addr::LOCALHOST, port)) {
            // The listener is dropped right away, freeing the port for the server.
            Ok(_listener) => return Ok(port),
            Err(error) => {
                debug!("port {port} unavailable: {error}");
                last_error = Some(error);
            }
        }
    }
    Err(PortSelectionError::new(start, u16::MAX, last_error))
}
