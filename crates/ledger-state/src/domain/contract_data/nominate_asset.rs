use serde::{Deserialize, Serialize};
use shared_types::codec::legacy::value_kind;
use shared_types::codec::{opt_str_value, LegacyArray};
use shared_types::{full_asset_id, Balance, CodecError, Value};

const ENTRY: &str = "NominateAsset";

/// One asset leg of an exchange or nomination.
///
/// Legacy form `[namespace, classId, blocksize, address, reference,
/// publicKey, signature]`. Missing or nil trailing slots read as empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NominateAsset {
    pub namespace: String,
    #[serde(rename = "assetId")]
    pub class_id: String,
    #[serde(rename = "amount")]
    pub block_size: Balance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl NominateAsset {
    pub fn new(namespace: impl Into<String>, class_id: impl Into<String>, block_size: Balance) -> Self {
        Self {
            namespace: namespace.into(),
            class_id: class_id.into(),
            block_size,
            ..Default::default()
        }
    }

    pub fn full_asset_id(&self) -> String {
        full_asset_id(&self.namespace, &self.class_id)
    }

    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::from(self.namespace.as_str()),
            Value::from(self.class_id.as_str()),
            self.block_size.to_value(),
            opt_str_value(self.address.as_deref()),
            opt_str_value(self.reference.as_deref()),
            opt_str_value(self.public_key.as_deref()),
            opt_str_value(self.signature.as_deref()),
        ])
    }

    pub fn from_value(value: &Value) -> Result<Self, CodecError> {
        let array = LegacyArray::new(value, ENTRY)?;
        Ok(Self {
            namespace: array.opt_string(0)?.unwrap_or_default(),
            class_id: array.opt_string(1)?.unwrap_or_default(),
            block_size: match array.opt_value(2) {
                Some(v) => Balance::from_value(v)?,
                None => Balance::zero(),
            },
            address: array.opt_string(3)?,
            reference: array.opt_string(4)?,
            public_key: array.opt_string(5)?,
            signature: array.opt_string(6)?,
        })
    }

    pub fn list_to_value(assets: &[NominateAsset]) -> Value {
        Value::Array(assets.iter().map(NominateAsset::to_value).collect())
    }

    /// A list of legacy assets, or a single asset array.
    pub fn list_from_value(value: &Value) -> Result<Vec<NominateAsset>, CodecError> {
        match value {
            Value::Nil => Ok(Vec::new()),
            Value::Array(items) if items.iter().all(|v| matches!(v, Value::Array(_))) => {
                items.iter().map(NominateAsset::from_value).collect()
            }
            Value::Array(_) => Ok(vec![NominateAsset::from_value(value)?]),
            other => Err(CodecError::UnexpectedType {
                expected: "array",
                found: value_kind(other),
            }),
        }
    }
}
