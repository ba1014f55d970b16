//! Concrete loot item representation
//!
//! The core codec only frames opaque envelopes; this module supplies the
//! backend's side of that contract. Each [`LootItem`] is serialized as a
//! big-endian `u32` length followed by its JSON body, which makes the
//! envelope self-delimiting as the codec requires.

use serde::{Deserialize, Serialize};

use mysticchests_shared::codec::{CodecError, ItemFormat};

/// One stack of items inside a chest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootItem {
    /// Material identifier, e.g. `"diamond_sword"`.
    pub material: String,

    /// Stack size.
    pub amount: u32,

    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl LootItem {
    pub fn new(material: impl Into<String>, amount: u32) -> Self {
        Self {
            material: material.into(),
            amount,
            display_name: None,
        }
    }

    pub fn named(material: impl Into<String>, amount: u32, name: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            amount,
            display_name: Some(name.into()),
        }
    }
}

/// Length-prefixed JSON envelope for [`LootItem`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct LootItemFormat;

impl ItemFormat for LootItemFormat {
    type Item = LootItem;

    fn serialize(&self, item: &LootItem, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let body = serde_json::to_vec(item).map_err(|e| CodecError::Item {
            message: format!("failed to serialize loot item: {e}"),
        })?;
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
        Ok(())
    }

    fn deserialize(&self, input: &mut &[u8], index: usize) -> Result<LootItem, CodecError> {
        if input.len() < 4 {
            return Err(CodecError::TruncatedItem { index });
        }
        let (prefix, rest) = input.split_at(4);
        let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        if rest.len() < len {
            return Err(CodecError::TruncatedItem { index });
        }
        let (body, rest) = rest.split_at(len);
        *input = rest;

        serde_json::from_slice(body).map_err(|e| CodecError::Item {
            message: format!("failed to deserialize loot item: {e}"),
        })
    }
}
