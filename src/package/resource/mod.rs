pub mod exemplar;
pub mod ltext;

use crate::error::Result;

pub use exemplar::{
    ExemplarProperty, ExemplarPropertyDataType, ExemplarPropertyValue, ExemplarResource,
};
pub use ltext::LtextResource;

/// SimCity 4 type IDs with a dedicated parser.
pub const EXEMPLAR_TYPE_ID: u32 = 0x6534284A;
pub const COHORT_TYPE_ID: u32 = 0x05342861;
pub const LTEXT_TYPE_ID: u32 = 0x2026960B;

pub trait Resource: std::fmt::Debug {
    fn from_bytes(data: &[u8]) -> Result<Self>
    where
        Self: Sized;
    fn to_bytes(&self) -> Result<Vec<u8>>;
}

/// A wrapper for unknown or generic resources
#[derive(Debug)]
pub struct GenericResource {
    pub data: Vec<u8>,
}

impl Resource for GenericResource {
    fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self {
            data: data.to_vec(),
        })
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }
}

#[derive(Debug)]
pub enum TypedResource {
    Exemplar(ExemplarResource),
    Ltext(LtextResource),
    Generic(GenericResource),
}

impl TypedResource {
    /// Dispatch on the record's type ID; anything without a dedicated
    /// parser passes through untouched.
    pub fn from_bytes(res_type: u32, data: &[u8]) -> Result<Self> {
        match res_type {
            EXEMPLAR_TYPE_ID | COHORT_TYPE_ID => {
                Ok(TypedResource::Exemplar(ExemplarResource::from_bytes(data)?))
            }
            LTEXT_TYPE_ID => Ok(TypedResource::Ltext(LtextResource::from_bytes(data)?)),
            _ => Ok(TypedResource::Generic(GenericResource::from_bytes(data)?)),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            TypedResource::Exemplar(e) => e.to_bytes(),
            TypedResource::Ltext(l) => l.to_bytes(),
            TypedResource::Generic(g) => g.to_bytes(),
        }
    }
}
