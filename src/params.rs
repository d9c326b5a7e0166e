//! Controlled vocabulary terms and user parameters attached to cached entities.
//!
//! Source formats describe most of their metadata through `cvParam` and `userParam`
//! elements. This module provides a small owned representation of them, enough to
//! carry ID-format declarations, MGF titles and per-entity param groups through the
//! cache.
use std::fmt::Display;
use std::str::{self, FromStr};

/// Split a CURIE like `MS:1000774` into its vocabulary and numeric accession
pub fn curie_to_num(curie: &str) -> (Option<ControlledVocabulary>, Option<u32>) {
    let mut parts = curie.splitn(2, ':');
    let prefix = parts
        .next()
        .and_then(|v| v.parse::<ControlledVocabulary>().ok())
        .and_then(|cv| cv.as_option());
    let accession = parts.next().and_then(|k| k.parse().ok());
    (prefix, accession)
}

pub trait ParamLike {
    fn name(&self) -> &str;
    fn value(&self) -> &str;
    fn accession(&self) -> Option<u32>;
    fn controlled_vocabulary(&self) -> Option<ControlledVocabulary>;

    fn coerce<T: str::FromStr>(&self) -> Result<T, T::Err> {
        self.value().parse::<T>()
    }

    fn is_controlled(&self) -> bool {
        self.accession().is_some()
    }

    fn curie(&self) -> Option<String> {
        match (self.controlled_vocabulary(), self.accession()) {
            (Some(cv), Some(acc)) => Some(format!("{}:{:07}", cv.prefix(), acc)),
            _ => None,
        }
    }

    /// Test whether this term carries the accession written as `curie`
    fn is_term(&self, curie: &str) -> bool {
        let (cv, acc) = curie_to_num(curie);
        acc.is_some() && self.accession() == acc && self.controlled_vocabulary() == cv
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub name: String,
    pub value: String,
    pub accession: Option<u32>,
    pub controlled_vocabulary: Option<ControlledVocabulary>,
}

impl Param {
    pub fn new() -> Param {
        Param {
            ..Default::default()
        }
    }

    pub fn new_key_value<K: Into<String>, V: Into<String>>(name: K, value: V) -> Param {
        Param {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Build a controlled term from a CURIE, e.g. `Param::from_curie("MS:1000774", "multiple peak list nativeID format")`
    pub fn from_curie<N: Into<String>>(curie: &str, name: N) -> Param {
        let (controlled_vocabulary, accession) = curie_to_num(curie);
        Param {
            name: name.into(),
            value: String::new(),
            accession,
            controlled_vocabulary,
        }
    }

    pub fn with_value<V: ToString>(mut self, value: V) -> Param {
        self.value = value.to_string();
        self
    }
}

impl ParamLike for Param {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn accession(&self) -> Option<u32> {
        self.accession
    }

    fn controlled_vocabulary(&self) -> Option<ControlledVocabulary> {
        self.controlled_vocabulary
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.curie() {
            Some(curie) => write!(f, "[{curie}, {}, {}]", self.name, self.value),
            None => write!(f, "[{}, {}]", self.name, self.value),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlledVocabulary {
    MS,
    UO,
    Unimod,
    PsiMod,
    Unknown,
}

const MS_CV: &str = "MS";
const UO_CV: &str = "UO";
const UNIMOD_CV: &str = "UNIMOD";
const PSI_MOD_CV: &str = "MOD";
const UNKNOWN_CV: &str = "?";

impl ControlledVocabulary {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::MS => MS_CV,
            Self::UO => UO_CV,
            Self::Unimod => UNIMOD_CV,
            Self::PsiMod => PSI_MOD_CV,
            Self::Unknown => UNKNOWN_CV,
        }
    }

    pub fn as_option(&self) -> Option<Self> {
        match self {
            Self::Unknown => None,
            _ => Some(*self),
        }
    }

    pub fn param<S: Into<String>>(&self, accession: u32, name: S) -> Param {
        Param {
            name: name.into(),
            value: String::new(),
            accession: Some(accession),
            controlled_vocabulary: Some(*self),
        }
    }

    pub fn param_val<S: Into<String>, V: ToString>(&self, accession: u32, name: S, value: V) -> Param {
        self.param(accession, name).with_value(value)
    }
}

impl FromStr for ControlledVocabulary {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MS" | "PSI-MS" => Ok(Self::MS),
            "UO" => Ok(Self::UO),
            "UNIMOD" | "Unimod" => Ok(Self::Unimod),
            "MOD" | "PSI-MOD" => Ok(Self::PsiMod),
            _ => Ok(Self::Unknown),
        }
    }
}

pub type ParamList = Vec<Param>;

pub trait ParamDescribed {
    fn params(&self) -> &ParamList;
    fn params_mut(&mut self) -> &mut ParamList;

    fn add_param(&mut self, param: Param) {
        self.params_mut().push(param);
    }

    fn get_param_by_name(&self, name: &str) -> Option<&Param> {
        self.params().iter().find(|p| p.name == name)
    }

    fn get_param_by_accession(&self, accession: &str) -> Option<&Param> {
        self.params().iter().find(|p| p.is_term(accession))
    }
}

#[macro_export]
macro_rules! impl_param_described {
    ($($t:ty), +) => {$(

        impl $crate::params::ParamDescribed for $t {
            fn params(&self) -> &$crate::params::ParamList {
                return &self.params
            }

            fn params_mut(&mut self) -> &mut $crate::params::ParamList {
                return &mut self.params
            }
        }
    )+};
}
