use crate::utils::error::{DirectoryError, ErrorCategory};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the eight ABO/Rh compatibility classes.
///
/// Variant order is the order buckets are listed in. Stored values are
/// read with the same leniency as [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum BloodGroup {
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::OPositive,
        BloodGroup::ONegative,
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('−', "-").to_ascii_uppercase();
        BloodGroup::ALL
            .into_iter()
            .find(|group| group.as_str() == normalized)
            .ok_or_else(|| {
                DirectoryError::validation(
                    "blood_group",
                    format!("'{}' is not one of O+, O-, A+, A-, AB+, AB-, B+, B-", s),
                )
            })
    }
}

impl TryFrom<String> for BloodGroup {
    type Error = DirectoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Unset text fields may be stored as an explicit null.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A registered user as stored in the `Users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    user_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    pub blood_group: BloodGroup,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub full_address: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

impl UserRecord {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        blood_group: BloodGroup,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            blood_group,
            full_address: String::new(),
            email: String::new(),
            phone_number: String::new(),
            profile_picture_url: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Fields to write in a single update. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }

    /// Store field names of the present values, in declaration order.
    pub fn field_names(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("fullAddress", self.full_address.is_some()),
            ("email", self.email.is_some()),
            ("phoneNumber", self.phone_number.is_some()),
            ("profilePictureUrl", self.profile_picture_url.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, present)| present.then_some(field))
        .collect()
    }

    pub fn apply_to(&self, record: &mut UserRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(address) = &self.full_address {
            record.full_address = address.clone();
        }
        if let Some(email) = &self.email {
            record.email = email.clone();
        }
        if let Some(phone) = &self.phone_number {
            record.phone_number = phone.clone();
        }
        if let Some(url) = &self.profile_picture_url {
            record.profile_picture_url = Some(url.clone());
        }
    }
}

/// A submitted edit form: the four text fields plus an optional new picture.
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub name: String,
    pub full_address: String,
    pub email: String,
    pub phone_number: String,
    pub picture: Option<Vec<u8>>,
}

impl ProfileEdit {
    /// Starts from the snapshot's current values, so an untouched edit is a no-op.
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            name: record.name.clone(),
            full_address: record.full_address.clone(),
            email: record.email.clone(),
            phone_number: record.phone_number.clone(),
            picture: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Unchanged,
    Updated(UserRecord),
}

/// Donors partitioned by blood group. Empty groups are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonorBuckets {
    buckets: BTreeMap<BloodGroup, Vec<UserRecord>>,
}

impl DonorBuckets {
    pub fn push(&mut self, record: UserRecord) {
        self.buckets.entry(record.blood_group).or_default().push(record);
    }

    pub fn get(&self, group: BloodGroup) -> &[UserRecord] {
        self.buckets.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BloodGroup, &[UserRecord])> {
        self.buckets
            .iter()
            .map(|(group, records)| (*group, records.as_slice()))
    }
}

impl FromIterator<UserRecord> for DonorBuckets {
    fn from_iter<I: IntoIterator<Item = UserRecord>>(iter: I) -> Self {
        let mut buckets = DonorBuckets::default();
        for record in iter {
            buckets.push(record);
        }
        buckets
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DonorQuery {
    Matches(Vec<UserRecord>),
    Grouped(DonorBuckets),
}

/// Request status: `Loading` first, then exactly one terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<T> {
    Loading,
    Success(T),
    Error {
        category: ErrorCategory,
        message: String,
    },
}

impl<T> Resource<T> {
    pub fn from_result(result: crate::utils::error::Result<T>) -> Self {
        match result {
            Ok(value) => Resource::Success(value),
            Err(e) => Resource::Error {
                category: e.category(),
                message: e.to_string(),
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Resource::Loading)
    }
}
