use travelmap_shared::{LeaderboardEntry, countries, initials, user_color};

use crate::colors::rgba_css;

pub const LEADERBOARD_LIMIT: u32 = 10;
pub const POLL_INTERVAL_MS: u32 = 60_000;
pub const MAX_FLAGS: usize = 5;
const FALLBACK_NAME: &str = "Traveler";

#[derive(Debug, Clone, PartialEq)]
pub struct RowFlag {
    pub alpha3: String,
    pub name: &'static str,
    pub flag_url: String,
}

/// Render-ready leaderboard row.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub user_id: String,
    pub first_name: String,
    pub avatar_url: Option<String>,
    pub avatar_color: String,
    pub avatar_initials: String,
    pub country_count: u32,
    pub flags: Vec<RowFlag>,
    /// Flags beyond [`MAX_FLAGS`], shown as `+N`.
    pub overflow: usize,
    pub is_current_user: bool,
}

impl LeaderboardRow {
    pub fn count_label(&self) -> String {
        let noun = if self.country_count == 1 {
            "country"
        } else {
            "countries"
        };
        format!("{} {noun}", self.country_count)
    }

    pub fn overflow_label(&self) -> Option<String> {
        (self.overflow > 0).then(|| format!("+{}", self.overflow))
    }
}

/// Flags ordered by popularity desc then alpha-3. Unknown codes are dropped.
/// Returns the first [`MAX_FLAGS`] and the count left over.
pub fn ordered_flags(codes: &[String]) -> (Vec<RowFlag>, usize) {
    let mut known: Vec<&'static countries::CountryMeta> =
        codes.iter().filter_map(|code| countries::by_alpha3(code)).collect();
    known.sort_by(|a, b| {
        b.popularity
            .cmp(&a.popularity)
            .then_with(|| a.alpha3.cmp(b.alpha3))
    });
    known.dedup_by_key(|meta| meta.alpha3);

    let overflow = known.len().saturating_sub(MAX_FLAGS);
    let flags = known
        .into_iter()
        .take(MAX_FLAGS)
        .map(|meta| RowFlag {
            alpha3: meta.alpha3.to_string(),
            name: meta.name,
            flag_url: meta.flag_url(),
        })
        .collect();
    (flags, overflow)
}

pub fn leaderboard_rows(entries: &[LeaderboardEntry], current_user: Option<&str>) -> Vec<LeaderboardRow> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let first_name = entry
                .display_name
                .as_deref()
                .and_then(|name| name.split_whitespace().next())
                .unwrap_or(FALLBACK_NAME)
                .to_string();
            let (r, g, b) = user_color(&entry.user_id);
            let (flags, overflow) = ordered_flags(&entry.country_codes);
            LeaderboardRow {
                rank: i + 1,
                user_id: entry.user_id.clone(),
                avatar_initials: initials(&first_name),
                first_name,
                avatar_url: entry.avatar_url.clone().filter(|url| !url.is_empty()),
                avatar_color: rgba_css(r, g, b, 0.85),
                country_count: entry.country_count,
                flags,
                overflow,
                is_current_user: current_user == Some(entry.user_id.as_str()),
            }
        })
        .collect()
}
