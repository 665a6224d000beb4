use uuid::Uuid;

use crate::{Error, Time, UserId};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct NookId(pub Uuid);

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Local,
    Global,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Temperature {
    Calm,
    Warm,
    Hot,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NookSort {
    #[default]
    Recent,
    Active,
    ExpiringSoon,
}

macro_rules! query_str {
    ($ty:ident { $($variant:ident => $s:expr,)* }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $s,)*
                }
            }
        }
    };
}

query_str!(Urgency { Low => "low", Medium => "medium", High => "high", });
query_str!(Scope { Local => "local", Global => "global", });
query_str!(Temperature { Calm => "calm", Warm => "warm", Hot => "hot", });
query_str!(NookSort { Recent => "recent", Active => "active", ExpiringSoon => "expiring_soon", });

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Nook {
    pub id: NookId,
    pub title: String,
    pub description: String,
    pub urgency: Urgency,
    pub scope: Scope,
    pub temperature: Temperature,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub member_count: u64,
    #[serde(default)]
    pub is_member: bool,
    pub created_at: Time,
    pub expires_at: Time,

    /// Server-computed, eg. "5h 12m left"
    pub time_left: String,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewNook {
    pub title: String,
    pub description: String,
    pub urgency: Urgency,
    pub scope: Scope,
    pub temperature: Temperature,
    pub hashtags: Vec<String>,
}

impl NewNook {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.title)?;
        crate::validate_string(&self.description)?;
        crate::validate_length(&self.title, crate::MAX_NOOK_TITLE_LEN)?;
        crate::validate_length(&self.description, crate::MAX_COMMENT_LEN)?;
        if self.title.trim().is_empty() {
            return Err(Error::Validation(String::from("nook title is required")));
        }
        for h in &self.hashtags {
            crate::validate_string(h)?;
            if h.is_empty() || h.chars().any(char::is_whitespace) {
                return Err(Error::Validation(format!("invalid hashtag {h:?}")));
            }
        }
        Ok(())
    }
}

/// Filters for the nook listing; unset fields are not sent
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NookFilter {
    pub urgency: Option<Urgency>,
    pub scope: Option<Scope>,
    pub temperature: Option<Temperature>,
    pub hashtag: Option<String>,
    pub sort: NookSort,
}

impl NookFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut res = Vec::new();
        if let Some(u) = self.urgency {
            res.push(("urgency", String::from(u.as_str())));
        }
        if let Some(s) = self.scope {
            res.push(("scope", String::from(s.as_str())));
        }
        if let Some(t) = self.temperature {
            res.push(("temperature", String::from(t.as_str())));
        }
        if let Some(h) = &self.hashtag {
            res.push(("hashtag", String::from(h.trim_start_matches('#'))));
        }
        res.push(("sort", String::from(self.sort.as_str())));
        res
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NookMember {
    pub user_id: UserId,
    pub joined_at: Time,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_nook(title: &str) -> NewNook {
        NewNook {
            title: String::from(title),
            description: String::new(),
            urgency: Urgency::Low,
            scope: Scope::Global,
            temperature: Temperature::Calm,
            hashtags: vec![String::from("night")],
        }
    }

    #[test]
    fn nook_validation() {
        assert!(new_nook("Can't sleep").validate().is_ok());
        assert!(new_nook(" ").validate().is_err());
        assert!(new_nook(&"t".repeat(121)).validate().is_err());
        let mut n = new_nook("ok");
        n.hashtags.push(String::from("two words"));
        assert!(n.validate().is_err());
    }

    #[test]
    fn filter_pairs() {
        assert_eq!(
            NookFilter::default().query_pairs(),
            vec![("sort", String::from("recent"))]
        );
        let f = NookFilter {
            urgency: Some(Urgency::High),
            scope: None,
            temperature: Some(Temperature::Hot),
            hashtag: Some(String::from("#exams")),
            sort: NookSort::ExpiringSoon,
        };
        assert_eq!(
            f.query_pairs(),
            vec![
                ("urgency", String::from("high")),
                ("temperature", String::from("hot")),
                ("hashtag", String::from("exams")),
                ("sort", String::from("expiring_soon")),
            ]
        );
    }
}
