//! Static country metadata for the 110m world boundary dataset.

/// Identity and ranking data for one country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryMeta {
    /// ISO 3166-1 numeric code, zero-padded to three digits.
    pub numeric: &'static str,
    pub alpha2: &'static str,
    pub alpha3: &'static str,
    pub name: &'static str,
    /// Higher is more popular. Used to order flags on leaderboard rows.
    pub popularity: u8,
}

impl CountryMeta {
    const fn new(
        numeric: &'static str,
        alpha2: &'static str,
        alpha3: &'static str,
        name: &'static str,
        popularity: u8,
    ) -> Self {
        Self {
            numeric,
            alpha2,
            alpha3,
            name,
            popularity,
        }
    }

    pub fn flag_url(&self) -> String {
        flag_url(self.alpha2)
    }
}

pub const FLAG_CDN_BASE: &str = "https://flagcdn.com/w640";

pub fn flag_url(alpha2: &str) -> String {
    format!("{FLAG_CDN_BASE}/{}.png", alpha2.to_ascii_lowercase())
}

/// Number of countries that can be marked visited.
pub const TOTAL_COUNTRIES: usize = COUNTRIES.len();

pub fn all() -> &'static [CountryMeta] {
    COUNTRIES
}

pub fn by_numeric(numeric: &str) -> Option<&'static CountryMeta> {
    COUNTRIES.iter().find(|c| c.numeric == numeric)
}

pub fn by_alpha2(alpha2: &str) -> Option<&'static CountryMeta> {
    COUNTRIES.iter().find(|c| c.alpha2.eq_ignore_ascii_case(alpha2))
}

pub fn by_alpha3(alpha3: &str) -> Option<&'static CountryMeta> {
    COUNTRIES.iter().find(|c| c.alpha3.eq_ignore_ascii_case(alpha3))
}

pub fn alpha3_for(numeric: &str) -> Option<&'static str> {
    by_numeric(numeric).map(|c| c.alpha3)
}

pub fn alpha2_for(numeric: &str) -> Option<&'static str> {
    by_numeric(numeric).map(|c| c.alpha2)
}

pub fn numeric_for(alpha3: &str) -> Option<&'static str> {
    by_alpha3(alpha3).map(|c| c.numeric)
}

pub fn name_for(numeric: &str) -> Option<&'static str> {
    by_numeric(numeric).map(|c| c.name)
}

/// Unknown codes rank below every known country.
pub fn popularity(alpha3: &str) -> u8 {
    by_alpha3(alpha3).map_or(0, |c| c.popularity)
}

/// Order alpha-3 codes by popularity descending, then alphabetically.
pub fn sort_by_popularity<S: AsRef<str>>(codes: &mut [S]) {
    codes.sort_by(|a, b| {
        let (a, b) = (a.as_ref(), b.as_ref());
        popularity(b).cmp(&popularity(a)).then_with(|| a.cmp(b))
    });
}

const COUNTRIES: &[CountryMeta] = &[
    CountryMeta::new("004", "AF", "AFG", "Afghanistan", 10),
    CountryMeta::new("008", "AL", "ALB", "Albania", 10),
    CountryMeta::new("010", "AQ", "ATA", "Antarctica", 10),
    CountryMeta::new("012", "DZ", "DZA", "Algeria", 10),
    CountryMeta::new("024", "AO", "AGO", "Angola", 10),
    CountryMeta::new("031", "AZ", "AZE", "Azerbaijan", 10),
    CountryMeta::new("032", "AR", "ARG", "Argentina", 24),
    CountryMeta::new("036", "AU", "AUS", "Australia", 30),
    CountryMeta::new("040", "AT", "AUT", "Austria", 78),
    CountryMeta::new("044", "BS", "BHS", "Bahamas", 10),
    CountryMeta::new("050", "BD", "BGD", "Bangladesh", 10),
    CountryMeta::new("051", "AM", "ARM", "Armenia", 10),
    CountryMeta::new("056", "BE", "BEL", "Belgium", 32),
    CountryMeta::new("064", "BT", "BTN", "Bhutan", 10),
    CountryMeta::new("068", "BO", "BOL", "Bolivia", 10),
    CountryMeta::new("070", "BA", "BIH", "Bosnia and Herzegovina", 10),
    CountryMeta::new("072", "BW", "BWA", "Botswana", 10),
    CountryMeta::new("076", "BR", "BRA", "Brazil", 26),
    CountryMeta::new("084", "BZ", "BLZ", "Belize", 10),
    CountryMeta::new("090", "SB", "SLB", "Solomon Islands", 10),
    CountryMeta::new("096", "BN", "BRN", "Brunei", 10),
    CountryMeta::new("100", "BG", "BGR", "Bulgaria", 10),
    CountryMeta::new("104", "MM", "MMR", "Myanmar", 10),
    CountryMeta::new("108", "BI", "BDI", "Burundi", 10),
    CountryMeta::new("112", "BY", "BLR", "Belarus", 10),
    CountryMeta::new("116", "KH", "KHM", "Cambodia", 10),
    CountryMeta::new("120", "CM", "CMR", "Cameroon", 10),
    CountryMeta::new("124", "CA", "CAN", "Canada", 70),
    CountryMeta::new("140", "CF", "CAF", "Central African Republic", 10),
    CountryMeta::new("144", "LK", "LKA", "Sri Lanka", 10),
    CountryMeta::new("148", "TD", "TCD", "Chad", 10),
    CountryMeta::new("152", "CL", "CHL", "Chile", 10),
    CountryMeta::new("156", "CN", "CHN", "China", 82),
    CountryMeta::new("158", "TW", "TWN", "Taiwan", 10),
    CountryMeta::new("170", "CO", "COL", "Colombia", 10),
    CountryMeta::new("178", "CG", "COG", "Republic of the Congo", 10),
    CountryMeta::new("180", "CD", "COD", "DR Congo", 10),
    CountryMeta::new("188", "CR", "CRI", "Costa Rica", 10),
    CountryMeta::new("191", "HR", "HRV", "Croatia", 68),
    CountryMeta::new("192", "CU", "CUB", "Cuba", 14),
    CountryMeta::new("196", "CY", "CYP", "Cyprus", 10),
    CountryMeta::new("203", "CZ", "CZE", "Czechia", 52),
    CountryMeta::new("204", "BJ", "BEN", "Benin", 10),
    CountryMeta::new("208", "DK", "DNK", "Denmark", 38),
    CountryMeta::new("214", "DO", "DOM", "Dominican Republic", 10),
    CountryMeta::new("218", "EC", "ECU", "Ecuador", 10),
    CountryMeta::new("222", "SV", "SLV", "El Salvador", 10),
    CountryMeta::new("226", "GQ", "GNQ", "Equatorial Guinea", 10),
    CountryMeta::new("231", "ET", "ETH", "Ethiopia", 10),
    CountryMeta::new("232", "ER", "ERI", "Eritrea", 10),
    CountryMeta::new("233", "EE", "EST", "Estonia", 10),
    CountryMeta::new("238", "FK", "FLK", "Falkland Islands", 10),
    CountryMeta::new("242", "FJ", "FJI", "Fiji", 10),
    CountryMeta::new("246", "FI", "FIN", "Finland", 10),
    CountryMeta::new("250", "FR", "FRA", "France", 100),
    CountryMeta::new("260", "TF", "ATF", "French Southern Territories", 10),
    CountryMeta::new("262", "DJ", "DJI", "Djibouti", 10),
    CountryMeta::new("266", "GA", "GAB", "Gabon", 10),
    CountryMeta::new("268", "GE", "GEO", "Georgia", 10),
    CountryMeta::new("270", "GM", "GMB", "Gambia", 10),
    CountryMeta::new("275", "PS", "PSE", "Palestine", 10),
    CountryMeta::new("276", "DE", "DEU", "Germany", 86),
    CountryMeta::new("288", "GH", "GHA", "Ghana", 10),
    CountryMeta::new("300", "GR", "GRC", "Greece", 80),
    CountryMeta::new("304", "GL", "GRL", "Greenland", 10),
    CountryMeta::new("320", "GT", "GTM", "Guatemala", 10),
    CountryMeta::new("324", "GN", "GIN", "Guinea", 10),
    CountryMeta::new("328", "GY", "GUY", "Guyana", 10),
    CountryMeta::new("332", "HT", "HTI", "Haiti", 10),
    CountryMeta::new("340", "HN", "HND", "Honduras", 10),
    CountryMeta::new("348", "HU", "HUN", "Hungary", 54),
    CountryMeta::new("352", "IS", "ISL", "Iceland", 18),
    CountryMeta::new("356", "IN", "IND", "India", 48),
    CountryMeta::new("360", "ID", "IDN", "Indonesia", 40),
    CountryMeta::new("364", "IR", "IRN", "Iran", 10),
    CountryMeta::new("368", "IQ", "IRQ", "Iraq", 10),
    CountryMeta::new("372", "IE", "IRL", "Ireland", 34),
    CountryMeta::new("376", "IL", "ISR", "Israel", 10),
    CountryMeta::new("380", "IT", "ITA", "Italy", 94),
    CountryMeta::new("384", "CI", "CIV", "Ivory Coast", 10),
    CountryMeta::new("388", "JM", "JAM", "Jamaica", 10),
    CountryMeta::new("392", "JP", "JPN", "Japan", 76),
    CountryMeta::new("398", "KZ", "KAZ", "Kazakhstan", 10),
    CountryMeta::new("400", "JO", "JOR", "Jordan", 10),
    CountryMeta::new("404", "KE", "KEN", "Kenya", 10),
    CountryMeta::new("408", "KP", "PRK", "North Korea", 10),
    CountryMeta::new("410", "KR", "KOR", "South Korea", 28),
    CountryMeta::new("414", "KW", "KWT", "Kuwait", 10),
    CountryMeta::new("417", "KG", "KGZ", "Kyrgyzstan", 10),
    CountryMeta::new("418", "LA", "LAO", "Laos", 10),
    CountryMeta::new("422", "LB", "LBN", "Lebanon", 10),
    CountryMeta::new("426", "LS", "LSO", "Lesotho", 10),
    CountryMeta::new("428", "LV", "LVA", "Latvia", 10),
    CountryMeta::new("430", "LR", "LBR", "Liberia", 10),
    CountryMeta::new("434", "LY", "LBY", "Libya", 10),
    CountryMeta::new("440", "LT", "LTU", "Lithuania", 10),
    CountryMeta::new("442", "LU", "LUX", "Luxembourg", 10),
    CountryMeta::new("450", "MG", "MDG", "Madagascar", 10),
    CountryMeta::new("454", "MW", "MWI", "Malawi", 10),
    CountryMeta::new("458", "MY", "MYS", "Malaysia", 66),
    CountryMeta::new("466", "ML", "MLI", "Mali", 10),
    CountryMeta::new("478", "MR", "MRT", "Mauritania", 10),
    CountryMeta::new("484", "MX", "MEX", "Mexico", 90),
    CountryMeta::new("496", "MN", "MNG", "Mongolia", 10),
    CountryMeta::new("498", "MD", "MDA", "Moldova", 10),
    CountryMeta::new("499", "ME", "MNE", "Montenegro", 10),
    CountryMeta::new("504", "MA", "MAR", "Morocco", 50),
    CountryMeta::new("508", "MZ", "MOZ", "Mozambique", 10),
    CountryMeta::new("512", "OM", "OMN", "Oman", 10),
    CountryMeta::new("516", "NA", "NAM", "Namibia", 10),
    CountryMeta::new("524", "NP", "NPL", "Nepal", 10),
    CountryMeta::new("528", "NL", "NLD", "Netherlands", 72),
    CountryMeta::new("540", "NC", "NCL", "New Caledonia", 10),
    CountryMeta::new("548", "VU", "VUT", "Vanuatu", 10),
    CountryMeta::new("554", "NZ", "NZL", "New Zealand", 22),
    CountryMeta::new("558", "NI", "NIC", "Nicaragua", 10),
    CountryMeta::new("562", "NE", "NER", "Niger", 10),
    CountryMeta::new("566", "NG", "NGA", "Nigeria", 10),
    CountryMeta::new("578", "NO", "NOR", "Norway", 20),
    CountryMeta::new("586", "PK", "PAK", "Pakistan", 10),
    CountryMeta::new("591", "PA", "PAN", "Panama", 10),
    CountryMeta::new("598", "PG", "PNG", "Papua New Guinea", 10),
    CountryMeta::new("600", "PY", "PRY", "Paraguay", 10),
    CountryMeta::new("604", "PE", "PER", "Peru", 16),
    CountryMeta::new("608", "PH", "PHL", "Philippines", 10),
    CountryMeta::new("616", "PL", "POL", "Poland", 60),
    CountryMeta::new("620", "PT", "PRT", "Portugal", 74),
    CountryMeta::new("624", "GW", "GNB", "Guinea-Bissau", 10),
    CountryMeta::new("626", "TL", "TLS", "Timor-Leste", 10),
    CountryMeta::new("630", "PR", "PRI", "Puerto Rico", 10),
    CountryMeta::new("634", "QA", "QAT", "Qatar", 10),
    CountryMeta::new("642", "RO", "ROU", "Romania", 10),
    CountryMeta::new("643", "RU", "RUS", "Russia", 56),
    CountryMeta::new("646", "RW", "RWA", "Rwanda", 10),
    CountryMeta::new("682", "SA", "SAU", "Saudi Arabia", 58),
    CountryMeta::new("686", "SN", "SEN", "Senegal", 10),
    CountryMeta::new("688", "RS", "SRB", "Serbia", 10),
    CountryMeta::new("694", "SL", "SLE", "Sierra Leone", 10),
    CountryMeta::new("703", "SK", "SVK", "Slovakia", 10),
    CountryMeta::new("704", "VN", "VNM", "Vietnam", 46),
    CountryMeta::new("705", "SI", "SVN", "Slovenia", 10),
    CountryMeta::new("706", "SO", "SOM", "Somalia", 10),
    CountryMeta::new("710", "ZA", "ZAF", "South Africa", 42),
    CountryMeta::new("716", "ZW", "ZWE", "Zimbabwe", 10),
    CountryMeta::new("724", "ES", "ESP", "Spain", 98),
    CountryMeta::new("728", "SS", "SSD", "South Sudan", 10),
    CountryMeta::new("729", "SD", "SDN", "Sudan", 10),
    CountryMeta::new("732", "EH", "ESH", "Western Sahara", 10),
    CountryMeta::new("740", "SR", "SUR", "Suriname", 10),
    CountryMeta::new("748", "SZ", "SWZ", "Eswatini", 10),
    CountryMeta::new("752", "SE", "SWE", "Sweden", 36),
    CountryMeta::new("756", "CH", "CHE", "Switzerland", 62),
    CountryMeta::new("760", "SY", "SYR", "Syria", 10),
    CountryMeta::new("762", "TJ", "TJK", "Tajikistan", 10),
    CountryMeta::new("764", "TH", "THA", "Thailand", 84),
    CountryMeta::new("768", "TG", "TGO", "Togo", 10),
    CountryMeta::new("780", "TT", "TTO", "Trinidad and Tobago", 10),
    CountryMeta::new("784", "AE", "ARE", "United Arab Emirates", 64),
    CountryMeta::new("788", "TN", "TUN", "Tunisia", 10),
    CountryMeta::new("792", "TR", "TUR", "Turkey", 92),
    CountryMeta::new("795", "TM", "TKM", "Turkmenistan", 10),
    CountryMeta::new("800", "UG", "UGA", "Uganda", 10),
    CountryMeta::new("804", "UA", "UKR", "Ukraine", 10),
    CountryMeta::new("807", "MK", "MKD", "North Macedonia", 10),
    CountryMeta::new("818", "EG", "EGY", "Egypt", 44),
    CountryMeta::new("826", "GB", "GBR", "United Kingdom", 88),
    CountryMeta::new("834", "TZ", "TZA", "Tanzania", 10),
    CountryMeta::new("840", "US", "USA", "United States", 96),
    CountryMeta::new("854", "BF", "BFA", "Burkina Faso", 10),
    CountryMeta::new("858", "UY", "URY", "Uruguay", 10),
    CountryMeta::new("860", "UZ", "UZB", "Uzbekistan", 10),
    CountryMeta::new("862", "VE", "VEN", "Venezuela", 10),
    CountryMeta::new("887", "YE", "YEM", "Yemen", 10),
    CountryMeta::new("894", "ZM", "ZMB", "Zambia", 10),
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn codes_are_unique() {
        let numeric: HashSet<_> = COUNTRIES.iter().map(|c| c.numeric).collect();
        let alpha2: HashSet<_> = COUNTRIES.iter().map(|c| c.alpha2).collect();
        let alpha3: HashSet<_> = COUNTRIES.iter().map(|c| c.alpha3).collect();
        assert_eq!(numeric.len(), TOTAL_COUNTRIES);
        assert_eq!(alpha2.len(), TOTAL_COUNTRIES);
        assert_eq!(alpha3.len(), TOTAL_COUNTRIES);
    }

    #[test]
    fn numeric_codes_are_three_digits() {
        for country in COUNTRIES {
            assert_eq!(country.numeric.len(), 3, "{}", country.name);
            assert!(country.numeric.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn lookups_agree() {
        let france = by_numeric("250").unwrap();
        assert_eq!(france.alpha3, "FRA");
        assert_eq!(alpha2_for("250"), Some("FR"));
        assert_eq!(numeric_for("fra"), Some("250"));
        assert_eq!(by_alpha2("fr").map(|c| c.numeric), Some("250"));
        assert_eq!(name_for("826"), Some("United Kingdom"));
        assert_eq!(alpha3_for("999"), None);
        assert_eq!(numeric_for("XXX"), None);
    }

    #[test]
    fn flag_url_uses_lowercase_alpha2() {
        assert_eq!(flag_url("FR"), "https://flagcdn.com/w640/fr.png");
        assert_eq!(
            by_alpha3("JPN").unwrap().flag_url(),
            "https://flagcdn.com/w640/jp.png"
        );
    }

    #[test]
    fn sorts_by_popularity_then_code() {
        let mut codes = vec!["BTN", "ZZZ", "USA", "FRA", "AFG"];
        sort_by_popularity(&mut codes);
        assert_eq!(codes, vec!["FRA", "USA", "AFG", "BTN", "ZZZ"]);
    }
}
