use serde::{Deserialize, Serialize};

use crate::{domain::PairId, errors::ValidationError};

/// One rule: messages from `donor_id` go to every channel in `recipient_ids`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardingPair {
    pub id: PairId,
    pub donor_id: String,
    pub recipient_ids: Vec<String>,
}

impl ForwardingPair {
    fn blank(id: PairId) -> Self {
        Self {
            id,
            donor_id: String::new(),
            recipient_ids: vec![String::new()],
        }
    }

    /// Remove controls are only offered while more than one destination remains.
    pub fn can_remove_recipient(&self) -> bool {
        self.recipient_ids.len() > 1
    }

    fn is_complete(&self) -> bool {
        !self.donor_id.trim().is_empty()
            && !self.recipient_ids.is_empty()
            && self.recipient_ids.iter().all(|r| !r.trim().is_empty())
    }
}

/// Replacement value for `ForwardingConfig::update_pair`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PairField {
    DonorId(String),
    RecipientIds(Vec<String>),
}

/// Insertion-ordered pair list. Pair ids are unique; channel ids may repeat.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ForwardingConfig {
    pairs: Vec<ForwardingPair>,
}

impl ForwardingConfig {
    pub fn pairs(&self) -> &[ForwardingPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, id: &PairId) -> Option<&ForwardingPair> {
        self.pairs.iter().find(|p| &p.id == id)
    }

    fn get_mut(&mut self, id: &PairId) -> Option<&mut ForwardingPair> {
        self.pairs.iter_mut().find(|p| &p.id == id)
    }

    /// Append a blank pair (empty source, one empty destination slot).
    pub fn add_pair(&mut self) -> PairId {
        let mut id = PairId::generate();
        while self.get(&id).is_some() {
            id = PairId::generate();
        }
        self.pairs.push(ForwardingPair::blank(id.clone()));
        id
    }

    pub fn remove_pair(&mut self, id: &PairId) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|p| &p.id != id);
        self.pairs.len() != before
    }

    pub fn update_pair(&mut self, id: &PairId, field: PairField) -> bool {
        let Some(pair) = self.get_mut(id) else {
            return false;
        };
        match field {
            PairField::DonorId(v) => pair.donor_id = v,
            PairField::RecipientIds(v) => pair.recipient_ids = v,
        }
        true
    }

    pub fn add_recipient(&mut self, id: &PairId) -> bool {
        let Some(pair) = self.get_mut(id) else {
            return false;
        };
        pair.recipient_ids.push(String::new());
        true
    }

    /// Does not enforce a minimum; submission validation does.
    pub fn remove_recipient(&mut self, id: &PairId, index: usize) -> bool {
        let Some(pair) = self.get_mut(id) else {
            return false;
        };
        if index >= pair.recipient_ids.len() {
            return false;
        }
        pair.recipient_ids.remove(index);
        true
    }

    pub fn update_recipient(&mut self, id: &PairId, index: usize, value: &str) -> bool {
        let Some(slot) = self
            .get_mut(id)
            .and_then(|p| p.recipient_ids.get_mut(index))
        else {
            return false;
        };
        *slot = value.to_string();
        true
    }

    /// Submission gate: at least one pair, and every pair fully filled in.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pairs.is_empty() {
            return Err(ValidationError::NoPairs);
        }
        match self.pairs.iter().position(|p| !p.is_complete()) {
            Some(idx) => Err(ValidationError::IncompletePair {
                position: idx + 1,
                id: self.pairs[idx].id.clone(),
            }),
            None => Ok(()),
        }
    }
}
