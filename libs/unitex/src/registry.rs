// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Textures registered by scripts, and frames waiting for the render thread.

use std::collections::HashMap;

use crate::{NativeTexture, OwnedFrame, Result, TextureId, UnitexError};

#[derive(Debug)]
struct TextureEntry {
    texture: NativeTexture,
    pending: Option<OwnedFrame>,
}

/// Textures known to the plugin, keyed by the id the script chose.
///
/// Each entry holds at most one pending frame; a newer submission replaces
/// an older one that the render thread has not applied yet.
#[derive(Debug, Default)]
pub struct TextureRegistry {
    entries: HashMap<TextureId, TextureEntry>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `texture` under `id`, returning the texture it replaced.
    pub fn register(&mut self, id: TextureId, texture: NativeTexture) -> Option<NativeTexture> {
        let previous = self.entries.insert(
            id,
            TextureEntry {
                texture,
                pending: None,
            },
        );
        if previous.is_some() {
            tracing::debug!("{} re-registered", id);
        }
        previous.map(|entry| entry.texture)
    }

    pub fn unregister(&mut self, id: TextureId) -> Option<NativeTexture> {
        self.entries.remove(&id).map(|entry| entry.texture)
    }

    pub fn get(&self, id: TextureId) -> Option<&NativeTexture> {
        self.entries.get(&id).map(|entry| &entry.texture)
    }

    /// Look up a texture or fail with [`UnitexError::NotFound`].
    pub fn texture(&self, id: TextureId) -> Result<NativeTexture> {
        self.get(id)
            .copied()
            .ok_or_else(|| UnitexError::NotFound(format!("{} is not registered", id)))
    }

    /// Park `frame` for `id` until [`take_pending`](Self::take_pending).
    pub fn submit(&mut self, id: TextureId, frame: OwnedFrame) -> Result<()> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| UnitexError::NotFound(format!("{} is not registered", id)))?;
        if entry.pending.replace(frame).is_some() {
            tracing::debug!("{}: pending frame replaced before upload", id);
        }
        Ok(())
    }

    /// Take the pending frame of `id`, with the texture to write it to.
    pub fn take_pending(&mut self, id: TextureId) -> Option<(NativeTexture, OwnedFrame)> {
        let entry = self.entries.get_mut(&id)?;
        entry.pending.take().map(|frame| (entry.texture, frame))
    }

    pub fn has_pending(&self, id: TextureId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| entry.pending.is_some())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
