//! Static reference tables.
//!
//! Everything here is configuration: qualitative labels, supplier notes and
//! the deterministic fallback values each source serves when its upstream is
//! unavailable. Derived figures (margins, totals, averages) are never stored
//! here; the aggregator computes them from source values.

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::market::{NewsItem, TradeRecord, WeatherReading};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryProfile {
    pub name: String,
    /// ISO 3166-1 alpha-2.
    pub iso_code: String,
    /// Country code used by the trade-statistics API.
    pub census_code: String,
    pub currency: String,
    #[serde(default)]
    pub specialties: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommodityProfile {
    pub name: String,
    pub hs_code: String,
    /// Economic-indicator series, if the commodity has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator: Option<String>,
    /// Multiplier converting the indicator's unit into `unit`.
    #[serde(default = "one")]
    pub indicator_scale: Decimal,
    pub unit: String,
    /// US market reference price served when the indicator is unavailable.
    pub fallback_price: Decimal,
    #[serde(default)]
    pub premium_potential: String,
}

/// A supplier-country to US-market trading lane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArbitrageLane {
    pub product: String,
    pub supplier_country: String,
    pub commodity: String,
    pub currency: String,
    /// Free-on-board price per unit, in `currency`.
    pub fob_local: Decimal,
    pub monthly_volume: Decimal,
    /// Freight, duty and handling as a fraction of the market price.
    pub logistics_cost_ratio: Decimal,
    pub risk_level: String,
    pub action_required: String,
    #[serde(default)]
    pub certification_premiums: Vec<String>,
    #[serde(default)]
    pub buyer_targets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgoaTable {
    pub year: String,
    pub countries: Vec<String>,
    /// Two-digit HS chapters treated as eligible.
    pub eligible_hs_prefixes: Vec<String>,
}

impl AgoaTable {
    pub fn country_eligible(&self, country: &str) -> bool {
        let country = country.trim();
        self.countries
            .iter()
            .any(|c| c.to_lowercase() == country.to_lowercase())
    }

    pub fn product_eligible(&self, product_code: &str) -> bool {
        let prefix: String = product_code.trim().chars().take(2).collect();
        prefix.len() == 2 && self.eligible_hs_prefixes.iter().any(|p| *p == prefix)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductTrend {
    pub product: String,
    /// Year-over-year growth, percent.
    pub annual_growth_pct: Decimal,
    pub price_trend: String,
    pub opportunity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MarketNotes {
    #[serde(default)]
    pub favorable_factors: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
    #[serde(default)]
    pub strategic_recommendations: Vec<String>,
}

/// All static tables consumed by sources and the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Catalogue {
    pub countries: Vec<CountryProfile>,
    pub commodities: Vec<CommodityProfile>,
    pub lanes: Vec<ArbitrageLane>,
    /// Broker commission as a fraction of lane revenue.
    pub commission_rate: Decimal,
    pub agoa: AgoaTable,
    pub trends: Vec<ProductTrend>,
    #[serde(default)]
    pub notes: MarketNotes,
    /// Units of currency per one USD.
    pub fallback_fx: BTreeMap<String, Decimal>,
    pub weather: Vec<WeatherReading>,
    pub default_weather: WeatherReading,
    pub sample_trade: Vec<TradeRecord>,
    pub default_news: Vec<NewsItem>,
}

impl Catalogue {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn commodity(&self, name: &str) -> Option<&CommodityProfile> {
        self.commodities.iter().find(|c| c.name == name)
    }

    pub fn commodity_names(&self) -> Vec<String> {
        self.commodities.iter().map(|c| c.name.clone()).collect()
    }

    /// Resolve a country by name, ISO code or trade-statistics code.
    pub fn country(&self, query: &str) -> Option<&CountryProfile> {
        let query = query.trim();
        self.countries.iter().find(|c| {
            c.name.eq_ignore_ascii_case(query)
                || c.iso_code.eq_ignore_ascii_case(query)
                || c.census_code == query
        })
    }

    pub fn country_codes(&self) -> Vec<String> {
        self.countries.iter().map(|c| c.iso_code.clone()).collect()
    }

    pub fn trend(&self, product: &str) -> Option<&ProductTrend> {
        self.trends.iter().find(|t| t.product == product)
    }

    pub fn product_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.lanes.iter().map(|l| l.commodity.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn supplier_countries(&self) -> Vec<String> {
        let mut countries: Vec<String> =
            self.lanes.iter().map(|l| l.supplier_country.clone()).collect();
        countries.sort();
        countries.dedup();
        countries
    }
}

fn one() -> Decimal {
    Decimal::ONE
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn country(name: &str, iso: &str, census: &str, currency: &str, specialties: &[&str]) -> CountryProfile {
    CountryProfile {
        name: name.to_string(),
        iso_code: iso.to_string(),
        census_code: census.to_string(),
        currency: currency.to_string(),
        specialties: strings(specialties),
    }
}

fn commodity(
    name: &str,
    hs_code: &str,
    indicator: Option<(&str, Decimal)>,
    unit: &str,
    fallback_price: Decimal,
    premium: &str,
) -> CommodityProfile {
    CommodityProfile {
        name: name.to_string(),
        hs_code: hs_code.to_string(),
        indicator: indicator.map(|(code, _)| code.to_string()),
        indicator_scale: indicator.map(|(_, scale)| scale).unwrap_or(Decimal::ONE),
        unit: unit.to_string(),
        fallback_price,
        premium_potential: premium.to_string(),
    }
}

fn weather(code: &str, temp: i32, humidity: u32, conditions: &str, rainfall: &str) -> WeatherReading {
    WeatherReading {
        country_code: code.to_string(),
        temperature_c: temp,
        humidity_pct: humidity,
        conditions: conditions.to_string(),
        rainfall: rainfall.to_string(),
    }
}

fn trend(product: &str, growth: Decimal, price_trend: &str, opportunity: &str) -> ProductTrend {
    ProductTrend {
        product: product.to_string(),
        annual_growth_pct: growth,
        price_trend: price_trend.to_string(),
        opportunity: opportunity.to_string(),
    }
}

fn trade_row(code: &str, name: &str, general: i64, consumption: i64) -> TradeRecord {
    TradeRecord {
        country_code: code.to_string(),
        country_name: name.to_string(),
        hs_code: "0901".to_string(),
        description: "COFFEE, WHETHER OR NOT ROASTED OR DECAFFEINATED".to_string(),
        general_value: Decimal::from(general),
        consumption_value: Decimal::from(consumption),
    }
}

impl Default for Catalogue {
    fn default() -> Self {
        let usd_kg = "USD/kg";
        Self {
            countries: vec![
                country("Ethiopia", "ET", "5300", "ETB", &["coffee", "spices", "pulses"]),
                country("Kenya", "KE", "7790", "KES", &["coffee", "tea", "flowers"]),
                country("Ghana", "GH", "7490", "GHS", &["cocoa", "shea_butter", "cashews"]),
                country("Nigeria", "NG", "7530", "NGN", &["cashews", "cocoa", "sesame"]),
                country("South Africa", "ZA", "7910", "ZAR", &["wine", "citrus", "nuts"]),
                country("Tanzania", "TZ", "7830", "TZS", &["coffee", "cashews", "spices"]),
                country("Uganda", "UG", "7850", "UGX", &["coffee", "vanilla", "fish"]),
                country("Côte d'Ivoire", "CI", "7320", "XOF", &["cocoa", "coffee", "cashews"]),
                country("Rwanda", "RW", "7690", "RWF", &["coffee", "tea", "pyrethrum"]),
                country("Morocco", "MA", "7140", "MAD", &["citrus", "olives", "argan"]),
                country("Madagascar", "MG", "7880", "MGA", &["vanilla", "cloves", "cocoa"]),
            ],
            commodities: vec![
                // cents/lb to USD/kg
                commodity("coffee", "0901", Some(("PCOFFOTMUSD", Decimal::new(220462, 7))), usd_kg, Decimal::new(780, 2), "high"),
                // USD/mt to USD/kg
                commodity("cocoa", "1801", Some(("PCOCOUSD", Decimal::new(1, 3))), usd_kg, Decimal::new(650, 2), "medium"),
                commodity("cashews", "0801", None, usd_kg, Decimal::new(825, 2), "high"),
                commodity("spices", "0910", None, usd_kg, Decimal::new(1240, 2), "very_high"),
                commodity("essential_oils", "3301", None, usd_kg, Decimal::new(4500, 2), "very_high"),
                commodity("shea_butter", "1515", None, usd_kg, Decimal::new(650, 2), "high"),
                commodity("vanilla", "0905", None, usd_kg, Decimal::new(32000, 2), "very_high"),
                // cents/kg to USD/kg
                commodity("tea", "0902", Some(("PTEA", Decimal::new(1, 2))), usd_kg, Decimal::new(320, 2), "medium"),
            ],
            lanes: vec![
                ArbitrageLane {
                    product: "Ethiopian Single-Origin Coffee".to_string(),
                    supplier_country: "Ethiopia".to_string(),
                    commodity: "coffee".to_string(),
                    currency: "ETB".to_string(),
                    fob_local: Decimal::new(24129, 2),
                    monthly_volume: Decimal::from(75_000),
                    logistics_cost_ratio: Decimal::new(11, 2),
                    risk_level: "Low".to_string(),
                    action_required: "IMMEDIATE - Contact Sidamo cooperatives".to_string(),
                    certification_premiums: strings(&["Organic: +25%", "Fair Trade: +15%"]),
                    buyer_targets: strings(&["Specialty coffee roasters", "Whole Foods", "Blue Bottle"]),
                },
                ArbitrageLane {
                    product: "Ghanaian Organic Shea Butter".to_string(),
                    supplier_country: "Ghana".to_string(),
                    commodity: "shea_butter".to_string(),
                    currency: "GHS".to_string(),
                    fob_local: Decimal::new(60116, 3),
                    monthly_volume: Decimal::from(25_000),
                    logistics_cost_ratio: Decimal::new(10, 2),
                    risk_level: "Low-Medium".to_string(),
                    action_required: "HIGH PRIORITY - Connect with women's cooperatives".to_string(),
                    certification_premiums: strings(&["Organic: +30%", "Women-owned: +20%"]),
                    buyer_targets: strings(&["Cosmetic manufacturers", "Natural products retailers"]),
                },
                ArbitrageLane {
                    product: "Madagascar Vanilla Extract".to_string(),
                    supplier_country: "Madagascar".to_string(),
                    commodity: "vanilla".to_string(),
                    currency: "MGA".to_string(),
                    fob_local: Decimal::from(819_000),
                    monthly_volume: Decimal::from(800),
                    logistics_cost_ratio: Decimal::new(10, 2),
                    risk_level: "Medium".to_string(),
                    action_required: "PRIORITY - Verify quality and certification".to_string(),
                    certification_premiums: strings(&["Organic: +40%", "Fair Trade: +25%"]),
                    buyer_targets: strings(&["Food manufacturers", "Specialty food distributors"]),
                },
                ArbitrageLane {
                    product: "Premium Ghanaian Cashews".to_string(),
                    supplier_country: "Ghana".to_string(),
                    commodity: "cashews".to_string(),
                    currency: "GHS".to_string(),
                    fob_local: Decimal::new(715064, 4),
                    monthly_volume: Decimal::from(40_000),
                    logistics_cost_ratio: Decimal::new(12, 2),
                    risk_level: "Medium".to_string(),
                    action_required: "HIGH PRIORITY - Contact Kwame Enterprises Ltd.".to_string(),
                    certification_premiums: strings(&["Organic: +20%"]),
                    buyer_targets: strings(&["Atlantic Nuts Trading Co.", "Snack manufacturers"]),
                },
                ArbitrageLane {
                    product: "Kenyan Highland Tea".to_string(),
                    supplier_country: "Kenya".to_string(),
                    commodity: "tea".to_string(),
                    currency: "KES".to_string(),
                    fob_local: Decimal::new(300825, 3),
                    monthly_volume: Decimal::from(60_000),
                    logistics_cost_ratio: Decimal::new(9, 2),
                    risk_level: "Low".to_string(),
                    action_required: "Request samples from Kericho estates".to_string(),
                    certification_premiums: strings(&["Rainforest Alliance: +10%"]),
                    buyer_targets: strings(&["Tea importers", "Private-label brands"]),
                },
                ArbitrageLane {
                    product: "Ivorian Cocoa Beans".to_string(),
                    supplier_country: "Côte d'Ivoire".to_string(),
                    commodity: "cocoa".to_string(),
                    currency: "XOF".to_string(),
                    fob_local: Decimal::new(29064, 1),
                    monthly_volume: Decimal::from(100_000),
                    logistics_cost_ratio: Decimal::new(8, 2),
                    risk_level: "Medium".to_string(),
                    action_required: "Verify export licences with the coffee-cocoa council".to_string(),
                    certification_premiums: strings(&["Fair Trade: +15%"]),
                    buyer_targets: strings(&["Chocolate manufacturers", "Bean-to-bar makers"]),
                },
            ],
            commission_rate: Decimal::new(5, 2),
            agoa: AgoaTable {
                year: "2024".to_string(),
                countries: strings(&[
                    "Angola", "Benin", "Botswana", "Burkina Faso", "Cameroon",
                    "Cape Verde", "Chad", "Comoros", "Democratic Republic of Congo",
                    "Republic of Congo", "Côte d'Ivoire", "Djibouti", "Eswatini",
                    "Ethiopia", "Gabon", "Gambia", "Ghana", "Guinea", "Guinea-Bissau",
                    "Kenya", "Lesotho", "Liberia", "Madagascar", "Malawi", "Mali",
                    "Mauritania", "Mauritius", "Mozambique", "Namibia", "Niger",
                    "Nigeria", "Rwanda", "São Tomé and Príncipe", "Senegal",
                    "Seychelles", "Sierra Leone", "South Africa", "Tanzania",
                    "Togo", "Uganda", "Zambia",
                ]),
                eligible_hs_prefixes: strings(&["07", "08", "09", "50", "51", "52", "61", "62", "63"]),
            },
            trends: vec![
                trend("coffee", Decimal::from(22), "Upward pressure", "Single-origin and organic segments"),
                trend("cocoa", Decimal::from(12), "Volatile but trending up", "Premium and ethical segments"),
                trend("cashews", Decimal::from(28), "Strong upward", "Organic and flavored varieties"),
                trend("shea_butter", Decimal::new(157, 1), "Steady", "Natural cosmetics"),
                trend("vanilla", Decimal::new(221, 1), "Volatile", "Certified organic extract"),
                trend("spices", Decimal::new(98, 1), "Stable", "Single-origin blends"),
                trend("tea", Decimal::new(85, 1), "Stable", "Specialty orthodox grades"),
                trend("essential_oils", Decimal::from(32), "Strong upward", "Argan, marula and shea oils"),
            ],
            notes: MarketNotes {
                favorable_factors: strings(&[
                    "Strong US demand for premium African products",
                    "AGOA duty-free benefits create cost advantage",
                    "Growing health/wellness trends favor natural products",
                    "Limited competition in specialty segments",
                ]),
                risk_factors: strings(&[
                    "Currency fluctuation (ETB, GHS, MGA vs USD)",
                    "Seasonal production variations",
                    "Quality consistency challenges",
                    "Shipping and logistics complexities",
                ]),
                recommended_actions: strings(&[
                    "Contact top suppliers in each category",
                    "Request samples and quality certifications",
                    "Negotiate exclusive distribution agreements",
                    "Secure pre-orders from identified US buyers",
                    "Implement currency hedging for large orders",
                ]),
                strategic_recommendations: strings(&[
                    "Focus on specialty/premium segments for higher margins",
                    "Develop direct relationships with certified producers",
                    "Position as expert in AGOA benefits and compliance",
                    "Build exclusive supplier partnerships in emerging categories",
                ]),
            },
            fallback_fx: [
                ("ETB", Decimal::new(5745, 2)),
                ("GHS", Decimal::new(1582, 2)),
                ("KES", Decimal::new(14325, 2)),
                ("NGN", Decimal::new(77550, 2)),
                ("ZAR", Decimal::new(1875, 2)),
                ("UGX", Decimal::from(3720)),
                ("TZS", Decimal::from(2510)),
                ("MWK", Decimal::from(1735)),
                ("ZMW", Decimal::new(2640, 2)),
                ("AOA", Decimal::from(830)),
                ("MAD", Decimal::new(1005, 2)),
                ("EGP", Decimal::new(3090, 2)),
                ("MGA", Decimal::from(4550)),
                ("XOF", Decimal::new(6055, 1)),
                ("RWF", Decimal::from(1290)),
                ("EUR", Decimal::new(92, 2)),
                ("GBP", Decimal::new(79, 2)),
            ]
            .into_iter()
            .map(|(code, rate)| (code.to_string(), rate))
            .collect(),
            weather: vec![
                weather("ET", 22, 65, "Partly Cloudy", "Moderate"),
                weather("KE", 26, 70, "Sunny", "Low"),
                weather("GH", 28, 75, "Humid", "High"),
                weather("NG", 31, 68, "Hot", "Low"),
                weather("ZA", 18, 55, "Clear", "Minimal"),
            ],
            default_weather: weather("", 25, 70, "Moderate", "Unknown"),
            sample_trade: vec![
                trade_row("7490", "GHANA", 15_000_000, 14_500_000),
                trade_row("5300", "ETHIOPIA", 8_500_000, 8_200_000),
                trade_row("7320", "COTE D'IVOIRE", 12_000_000, 11_500_000),
            ],
            default_news: vec![
                NewsItem {
                    title: "Africa Trade Relations Strengthen".to_string(),
                    summary: "Recent developments in AGOA framework show positive trends...".to_string(),
                    link: "#".to_string(),
                },
                NewsItem {
                    title: "Ethiopian Coffee Exports Reach Record High".to_string(),
                    summary: "Ethiopian coffee exports to the USA have increased by 25% this quarter..."
                        .to_string(),
                    link: "#".to_string(),
                },
            ],
        }
    }
}
