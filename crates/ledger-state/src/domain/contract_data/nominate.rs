use super::dictionary::{
    ContractDictionary, ContractHeader, DictReader, DictWriter, ASSETS_IN, ASSET_CLASS,
    BLOCK_SIZE_IN, BLOCK_SIZE_OUT, CONTRACT_ADDRESS, FUNCTION, INPUT_TOKEN_CLASS, METADATA,
    NAMESPACE, OUTPUT_TOKEN_CLASS, PROTOCOL,
};
use super::nominate_asset::NominateAsset;
use shared_types::{full_asset_id, Balance, CodecError};

pub const TOKENS_NOMINATE: &str = "tokens_nominate";
pub const NOMINATE: &str = "nominate";

/// Converts blocks of an input token class into an output token class
/// within one namespace.
#[derive(Clone, Debug, PartialEq)]
pub struct TokensNominateContract {
    pub header: ContractHeader,
    pub namespace: String,
    pub input_token_class: String,
    pub output_token_class: String,
    pub block_size_in: Balance,
    pub block_size_out: Balance,
    pub extra: ContractDictionary,
}

impl TokensNominateContract {
    pub fn new(header: ContractHeader, namespace: impl Into<String>) -> Self {
        Self {
            header,
            namespace: namespace.into(),
            input_token_class: String::new(),
            output_token_class: String::new(),
            block_size_in: Balance::zero(),
            block_size_out: Balance::zero(),
            extra: ContractDictionary::new(),
        }
    }

    pub fn input_asset_id(&self) -> String {
        full_asset_id(&self.namespace, &self.input_token_class)
    }

    pub fn output_asset_id(&self) -> String {
        full_asset_id(&self.namespace, &self.output_token_class)
    }

    pub(crate) fn read(mut reader: DictReader) -> Result<Self, CodecError> {
        let mut header = ContractHeader::read(&mut reader)?;
        // Token nominations never carry a start date.
        header.start_date = None;
        Ok(Self {
            header,
            namespace: reader.take_string(NAMESPACE)?.unwrap_or_default(),
            input_token_class: reader.take_string(INPUT_TOKEN_CLASS)?.unwrap_or_default(),
            output_token_class: reader.take_string(OUTPUT_TOKEN_CLASS)?.unwrap_or_default(),
            block_size_in: reader.take_balance(BLOCK_SIZE_IN)?.unwrap_or_default(),
            block_size_out: reader.take_balance(BLOCK_SIZE_OUT)?.unwrap_or_default(),
            extra: reader.into_rest(),
        })
    }

    pub fn to_dictionary(&self) -> ContractDictionary {
        let mut writer = DictWriter::with_rest(&self.extra);
        self.header.write(&mut writer, false);
        writer
            .put_str(FUNCTION, TOKENS_NOMINATE)
            .put_str(NAMESPACE, &self.namespace)
            .put_str(INPUT_TOKEN_CLASS, &self.input_token_class)
            .put_str(OUTPUT_TOKEN_CLASS, &self.output_token_class)
            .put(BLOCK_SIZE_IN, self.block_size_in.to_value())
            .put(BLOCK_SIZE_OUT, self.block_size_out.to_value());
        writer.finish()
    }
}

/// A holder's nomination of input tokens against a token-nominate contract.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NominateCommit {
    pub contract_address: Option<String>,
    pub namespace: Option<String>,
    pub asset_class: Option<String>,
    pub protocol: Option<String>,
    pub metadata: Option<String>,
    pub assets_in: Option<Vec<NominateAsset>>,
    pub extra: ContractDictionary,
}

impl NominateCommit {
    pub(crate) fn read(mut reader: DictReader) -> Result<Self, CodecError> {
        Ok(Self {
            contract_address: reader.take_string(CONTRACT_ADDRESS)?,
            namespace: reader.take_string(NAMESPACE)?,
            asset_class: reader.take_string(ASSET_CLASS)?,
            protocol: reader.take_string(PROTOCOL)?,
            metadata: reader.take_string(METADATA)?,
            assets_in: reader.take_assets(ASSETS_IN)?,
            extra: reader.into_rest(),
        })
    }

    pub fn to_dictionary(&self) -> ContractDictionary {
        DictWriter::with_rest(&self.extra)
            .put_str(FUNCTION, NOMINATE)
            .put_opt_str(CONTRACT_ADDRESS, self.contract_address.as_deref())
            .put_opt_str(NAMESPACE, self.namespace.as_deref())
            .put_opt_str(ASSET_CLASS, self.asset_class.as_deref())
            .put_opt_str(PROTOCOL, self.protocol.as_deref())
            .put_opt_str(METADATA, self.metadata.as_deref())
            .put_assets(ASSETS_IN, self.assets_in.as_deref())
            .finish()
    }
}
