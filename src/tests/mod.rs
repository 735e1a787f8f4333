//! Library tests and fixtures
