use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::entities::{movie, tv_show};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Movie => "MOVIE",
            MediaType::Tv => "TV",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MOVIE" => Some(MediaType::Movie),
            "TV" => Some(MediaType::Tv),
            _ => None,
        }
    }
}

/// Which personal list a library entry belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Watched,
    Watchlist,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Watched => "watched",
            ListKind::Watchlist => "watchlist",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "watched" => Some(ListKind::Watched),
            "watchlist" => Some(ListKind::Watchlist),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewRole {
    Actor,
    Director,
    Producer,
    ExecutiveProducer,
    Writer,
    Composer,
    Cinematographer,
}

impl CrewRole {
    pub const ALL: [CrewRole; 7] = [
        CrewRole::Actor,
        CrewRole::Director,
        CrewRole::Producer,
        CrewRole::ExecutiveProducer,
        CrewRole::Writer,
        CrewRole::Composer,
        CrewRole::Cinematographer,
    ];

    /// Tag stored in `movie_credits.role` and `people.roles`.
    pub fn as_str(self) -> &'static str {
        match self {
            CrewRole::Actor => "actor",
            CrewRole::Director => "director",
            CrewRole::Producer => "producer",
            CrewRole::ExecutiveProducer => "executive_producer",
            CrewRole::Writer => "writer",
            CrewRole::Composer => "composer",
            CrewRole::Cinematographer => "cinematographer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        CrewRole::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

/// A star rating between 0.5 and 5.0 in half steps, stored as half-star count.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rating(u8);

impl Rating {
    pub const MIN_HALVES: u8 = 1;
    pub const MAX_HALVES: u8 = 10;

    pub fn from_halves(halves: u8) -> Option<Self> {
        (Self::MIN_HALVES..=Self::MAX_HALVES).contains(&halves).then_some(Self(halves))
    }

    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let doubled = value * 2.0;
        if doubled.fract() != 0.0 || doubled < 0.0 || doubled > f64::from(Self::MAX_HALVES) {
            return None;
        }
        Self::from_halves(doubled as u8)
    }

    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<f64>().ok().and_then(Self::from_f64)
    }

    pub fn halves(self) -> u8 {
        self.0
    }

    pub fn value(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 { write!(f, "{}", self.0 / 2) } else { write!(f, "{}.5", self.0 / 2) }
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortOrder {
    #[default]
    Default,
    RuntimeDesc,
    RuntimeAsc,
}

impl SortOrder {
    pub fn param(self) -> Option<&'static str> {
        match self {
            SortOrder::Default => None,
            SortOrder::RuntimeDesc => Some("runtime-desc"),
            SortOrder::RuntimeAsc => Some("runtime-asc"),
        }
    }

    pub fn from_param(s: &str) -> Self {
        match s {
            "runtime-desc" => SortOrder::RuntimeDesc,
            "runtime-asc" => SortOrder::RuntimeAsc,
            _ => SortOrder::Default,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleSummary {
    pub id: i32,
    pub title: String,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
}

impl From<movie::Model> for TitleSummary {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            release_date: m.release_date,
            runtime: m.runtime,
            overview: m.overview,
            poster_path: m.poster_path,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowSummary {
    pub id: i32,
    pub name: String,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
}

impl From<tv_show::Model> for ShowSummary {
    fn from(s: tv_show::Model) -> Self {
        Self {
            id: s.id,
            name: s.name,
            first_air_date: s.first_air_date,
            overview: s.overview,
            poster_path: s.poster_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_accepts_half_steps_only() {
        assert_eq!(Rating::parse("3.5").map(Rating::halves), Some(7));
        assert_eq!(Rating::parse("5").map(Rating::halves), Some(10));
        assert_eq!(Rating::parse("0.5").map(Rating::halves), Some(1));
        assert_eq!(Rating::parse("0"), None);
        assert_eq!(Rating::parse("3.25"), None);
        assert_eq!(Rating::parse("5.5"), None);
        assert_eq!(Rating::parse("-1"), None);
        assert_eq!(Rating::parse("NaN"), None);
        assert_eq!(Rating::parse("abc"), None);
    }

    #[test]
    fn rating_display_drops_trailing_zero() {
        assert_eq!(Rating::from_halves(8).unwrap().to_string(), "4");
        assert_eq!(Rating::from_halves(7).unwrap().to_string(), "3.5");
        assert_eq!(Rating::from_halves(1).unwrap().to_string(), "0.5");
    }

    #[test]
    fn crew_role_tags_round_trip() {
        for role in CrewRole::ALL {
            assert_eq!(CrewRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(CrewRole::parse("gaffer"), None);
    }

    #[test]
    fn list_kind_tags() {
        assert_eq!(ListKind::parse(ListKind::Watchlist.as_str()), Some(ListKind::Watchlist));
        assert_eq!(ListKind::parse("favourites"), None);
    }
}
