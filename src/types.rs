//! Core types for portal-members

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A public portal group as returned by the group search
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique group id
    pub id: String,

    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Owning username
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner: String,

    /// Creation time
    #[serde(
        default,
        with = "lenient_millis_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<DateTime<Utc>>,

    /// Last modification time
    #[serde(
        default,
        with = "lenient_millis_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub modified: Option<DateTime<Utc>>,
}

/// One entry of a group's user list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Portal username
    pub username: String,

    /// Display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,

    /// Role within the group (owner, admin, member)
    #[serde(default, deserialize_with = "null_as_default")]
    pub member_type: String,

    /// When the user joined the group; the epoch when absent, null or out of range
    #[serde(default = "unix_epoch", with = "lenient_millis")]
    pub joined: DateTime<Utc>,
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

// The portal sends `null` for blank fields; read it like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Epoch milliseconds; null or unrepresentable values fall back to the epoch
mod lenient_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub use chrono::serde::ts_milliseconds::serialize;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<i64>::deserialize(deserializer)?;
        Ok(millis
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or(DateTime::UNIX_EPOCH))
    }
}

// Optional epoch milliseconds; unrepresentable values read as absent
mod lenient_millis_option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub use chrono::serde::ts_milliseconds_option::serialize;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<i64>::deserialize(deserializer)?;
        Ok(millis.and_then(DateTime::from_timestamp_millis))
    }
}

/// Position in a paginated collection
///
/// `Next(n)` is the start index for the following request; `End` is the
/// server's "no further pages" sentinel (`nextStart == -1` on the wire).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// More pages remain, starting at this index
    Next(u64),
    /// Pagination finished
    End,
}

impl Cursor {
    /// Map the wire value: any negative start index ends pagination
    pub fn from_wire(next_start: i64) -> Self {
        u64::try_from(next_start).map_or(Cursor::End, Cursor::Next)
    }

    /// True once the server reported the last page
    pub fn is_end(&self) -> bool {
        matches!(self, Cursor::End)
    }
}

/// Items carried by one page of a listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageItems {
    /// Group search results (`results` array)
    Groups(Vec<Group>),
    /// Group user list (`users` array)
    Members(Vec<Member>),
    /// Neither array was present
    Empty,
}

impl PageItems {
    /// Number of items on the page
    pub fn len(&self) -> usize {
        match self {
            PageItems::Groups(groups) => groups.len(),
            PageItems::Members(members) => members.len(),
            PageItems::Empty => 0,
        }
    }

    /// True if the page carried no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One decoded page of a listing endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// Items, in server order
    pub items: PageItems,
    /// Size of the whole collection as reported by the server
    pub total_count: i64,
    /// Start index of this page
    pub start_index: i64,
    /// Number of items requested per page
    pub page_size: i64,
    /// Where the next page starts
    pub next: Cursor,
}

impl Page {
    /// Take the groups off the page; empty for any other payload shape
    pub fn into_groups(self) -> Vec<Group> {
        match self.items {
            PageItems::Groups(groups) => groups,
            _ => Vec::new(),
        }
    }

    /// Take the members off the page; empty for any other payload shape
    pub fn into_members(self) -> Vec<Member> {
        match self.items {
            PageItems::Members(members) => members,
            _ => Vec::new(),
        }
    }
}

/// Flat (group, member) record handed to the output sink
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    /// Owning group id
    pub group_id: String,
    /// Member username
    pub username: String,
    /// Member display name
    pub full_name: String,
    /// Join time
    pub joined: DateTime<Utc>,
}

impl OutputRecord {
    /// Build the record for a member of a group
    pub fn new(group: &Group, member: Member) -> Self {
        Self {
            group_id: group.id.clone(),
            username: member.username,
            full_name: member.full_name,
            joined: member.joined,
        }
    }
}

impl std::fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, \"{}\", {}",
            self.group_id,
            self.username,
            self.full_name,
            self.joined.timestamp_millis()
        )
    }
}
