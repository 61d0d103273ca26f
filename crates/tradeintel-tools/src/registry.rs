use std::collections::HashMap;

use tradeintel_models::{Catalogue, FieldSpec, InputShape, ToolDescriptor};

use crate::error::RegistryError;

/// Handler tag for each registered tool. The aggregator matches on this
/// instead of comparing tool names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ExchangeRates,
    CommodityPrices,
    TradeData,
    TradeNews,
    Weather,
    CommoditySnapshot,
    ArbitrageScan,
    MarketTrends,
    AgoaCountries,
    AgoaEligibility,
    MarketOverview,
}

#[derive(Debug, Clone)]
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub operation: Operation,
}

/// Collects tools before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    tools: Vec<RegisteredTool>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        name: &str,
        description: &str,
        input_shape: InputShape,
        operation: Operation,
    ) -> Self {
        self.tools.push(RegisteredTool {
            descriptor: ToolDescriptor {
                name: name.to_string(),
                description: description.to_string(),
                input_shape,
            },
            operation,
        });
        self
    }

    pub fn build(self) -> Result<ToolRegistry, RegistryError> {
        let mut order = Vec::with_capacity(self.tools.len());
        let mut tools = HashMap::with_capacity(self.tools.len());
        for tool in self.tools {
            let name = tool.descriptor.name.clone();
            if tools.contains_key(&name) {
                return Err(RegistryError::DuplicateTool(name));
            }
            order.push(name.clone());
            tools.insert(name, tool);
        }
        Ok(ToolRegistry { order, tools })
    }
}

/// Immutable name-to-tool table, built once at startup.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    order: Vec<String>,
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| &tool.descriptor)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The fixed tool catalogue. Enumerated fields draw their allowed values
    /// from `catalogue` so a replaced catalogue also changes the schemas.
    pub fn standard(catalogue: &Catalogue) -> Result<Self, RegistryError> {
        let commodities = catalogue.commodity_names();
        let categories = catalogue.product_categories();
        let country_codes = catalogue.country_codes();

        RegistryBuilder::new()
            .register(
                "get_exchange_rates",
                "Currency exchange rates for a base currency",
                InputShape::new(vec![
                    FieldSpec::string("base", "Base currency code (default USD)"),
                    FieldSpec::string_array("symbols", "Currency codes to return; all when omitted"),
                ]),
                Operation::ExchangeRates,
            )
            .register(
                "get_commodity_prices",
                "US market reference prices for tracked commodities",
                InputShape::new(vec![FieldSpec::string_array(
                    "commodities",
                    "Commodities to price; all when omitted",
                )
                .one_of(commodities.clone())]),
                Operation::CommodityPrices,
            )
            .register(
                "get_trade_data",
                "US import statistics for a product from one country",
                InputShape::new(vec![
                    FieldSpec::string("country", "Country name, ISO code or trade-statistics code")
                        .required(),
                    FieldSpec::string("product_code", "HS code with 2, 4 or 6 digits").required(),
                    FieldSpec::integer("year", "Statistics year").required().range(2000, 2100),
                    FieldSpec::integer("month", "Statistics month (default 12)").range(1, 12),
                ]),
                Operation::TradeData,
            )
            .register(
                "get_trade_news",
                "Recent trade headlines filtered by keyword",
                InputShape::new(vec![
                    FieldSpec::string_array(
                        "keywords",
                        "Keywords to match (default africa, trade, agriculture)",
                    ),
                    FieldSpec::integer("limit", "Maximum headlines (default 5)").range(1, 50),
                ]),
                Operation::TradeNews,
            )
            .register(
                "get_weather",
                "Growing conditions for a producing country",
                InputShape::new(vec![FieldSpec::string(
                    "country_code",
                    "ISO 3166-1 alpha-2 country code",
                )
                .required()]),
                Operation::Weather,
            )
            .register(
                "commodity_snapshot",
                "Exchange rates, commodity prices and weather in one payload",
                InputShape::new(vec![FieldSpec::string_array(
                    "countries",
                    "Country codes for weather; all tracked countries when omitted",
                )
                .one_of(country_codes)]),
                Operation::CommoditySnapshot,
            )
            .register(
                "scan_arbitrage_opportunities",
                "Rank supplier lanes by margin between local FOB and US market price",
                InputShape::new(vec![
                    FieldSpec::number("min_margin", "Minimum gross margin, percent")
                        .required()
                        .range(0, 100),
                    FieldSpec::string_array("product_categories", "Commodities to include")
                        .one_of(categories),
                    FieldSpec::string_array("focus_countries", "Supplier countries to include"),
                    FieldSpec::integer("top_n", "Maximum opportunities (default 10)").range(1, 100),
                ]),
                Operation::ArbitrageScan,
            )
            .register(
                "analyze_market_trends",
                "Growth and price trends per product over a timeframe",
                InputShape::new(vec![
                    FieldSpec::string("timeframe", "Analysis timeframe")
                        .required()
                        .one_of(["weekly", "monthly", "quarterly", "yearly"]),
                    FieldSpec::string_array("products", "Products to analyze").one_of(commodities),
                ]),
                Operation::MarketTrends,
            )
            .register(
                "get_agoa_countries",
                "Countries eligible for AGOA trade preferences",
                InputShape::new(vec![FieldSpec::string("year", "Eligibility year (default 2024)")]),
                Operation::AgoaCountries,
            )
            .register(
                "check_agoa_eligibility",
                "Whether a country and product qualify for AGOA duty-free entry",
                InputShape::new(vec![
                    FieldSpec::string("country", "Country name").required(),
                    FieldSpec::string("product_code", "HS code").required(),
                ]),
                Operation::AgoaEligibility,
            )
            .register(
                "market_overview",
                "Summary of current arbitrage opportunities and market conditions",
                InputShape::empty(),
                Operation::MarketOverview,
            )
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_every_tool() {
        let registry = ToolRegistry::standard(&Catalogue::default()).unwrap();
        assert_eq!(registry.len(), 11);
        let names: Vec<&str> = registry.descriptors().map(|d| d.name.as_str()).collect();
        assert_eq!(names[0], "get_exchange_rates");
        assert_eq!(names[10], "market_overview");
        assert_eq!(
            registry.get("scan_arbitrage_opportunities").unwrap().operation,
            Operation::ArbitrageScan
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = RegistryBuilder::new()
            .register("ping", "a", InputShape::empty(), Operation::MarketOverview)
            .register("ping", "b", InputShape::empty(), Operation::MarketOverview)
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("ping".to_string()));
    }

    #[test]
    fn enums_come_from_catalogue() {
        let registry = ToolRegistry::standard(&Catalogue::default()).unwrap();
        let shape = &registry.get("get_commodity_prices").unwrap().descriptor.input_shape;
        let allowed = shape.field("commodities").unwrap().allowed.as_ref().unwrap();
        assert!(allowed.contains(&"vanilla".to_string()));
    }
}
