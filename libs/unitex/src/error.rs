// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnitexError {
    #[error("GPU operation failed: {0}")]
    Gpu(String),

    #[error("Texture operation failed: {0}")]
    Texture(String),

    #[error("Invalid frame buffer: {0}")]
    Frame(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, UnitexError>;
