//! Rule-based intent resolution.
//!
//! Used when the language-model backend is unavailable or returns something
//! unparseable. Each rule maps an action to trigger groups over normalized
//! text; a group matches when all of its keywords occur. Keywords cover
//! English, Devanagari Hindi, and romanized Hinglish. Rules are ordered most
//! specific first and the first rule that matches *and* can extract its
//! required parameters wins.

use serde_json::{Map, Value};

use kirana_core::catalog::CommandAction;
use kirana_core::command::ResolvedIntent;
use kirana_core::domain::order::OrderStatus;

pub struct PatternResolver {
    rules: Vec<Rule>,
}

struct Rule {
    action: &'static str,
    entity: Option<&'static str>,
    triggers: &'static [&'static [&'static str]],
}

impl Default for PatternResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternResolver {
    pub fn new() -> Self {
        Self { rules: rules() }
    }

    pub fn resolve(&self, text: &str) -> Option<ResolvedIntent> {
        let normalized = normalize(text);

        for rule in &self.rules {
            let matched = rule
                .triggers
                .iter()
                .any(|group| group.iter().all(|keyword| normalized.contains(keyword)));
            if !matched {
                continue;
            }

            let Some(parameters) = extract_parameters(rule.action, &normalized, text) else {
                continue;
            };

            let mut intent = ResolvedIntent::new(rule.action);
            intent.entity = rule.entity.map(str::to_string);
            intent.parameters = parameters;
            intent.requires_confirmation = CommandAction::is_destructive_tag(rule.action);
            intent.fallback = true;
            return Some(intent);
        }

        None
    }
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
}

fn rules() -> Vec<Rule> {
    vec![
        Rule {
            action: "get_pending_shops",
            entity: Some("shop"),
            triggers: &[
                &["pending", "shop"],
                &["पेंडिंग", "दुकान"],
                &["approval", "shop"],
                &["इंतज़ार", "दुकान"],
            ],
        },
        Rule {
            action: "verify_shop",
            entity: Some("shop"),
            triggers: &[
                &["verify", "shop"],
                &["approve", "shop"],
                &["shop", "verify"],
                &["दुकान", "वेरिफाई"],
                &["दुकान", "मंजूरी"],
                &["दुकान", "approve"],
            ],
        },
        Rule {
            action: "suspend_shop",
            entity: Some("shop"),
            triggers: &[
                &["suspend", "shop"],
                &["shop", "suspend"],
                &["दुकान", "बंद"],
                &["shop", "band"],
                &["दुकान", "सस्पेंड"],
            ],
        },
        Rule {
            action: "activate_shop",
            entity: Some("shop"),
            triggers: &[
                &["activate", "shop"],
                &["reactivate", "shop"],
                &["shop", "activate"],
                &["दुकान", "चालू"],
                &["shop", "chalu"],
                &["दुकान", "एक्टिवेट"],
            ],
        },
        Rule {
            action: "prefill_shop_form",
            entity: Some("shop"),
            triggers: &[
                &["add", "shop"],
                &["create", "shop"],
                &["register", "shop"],
                &["new", "shop"],
                &["shop", "banao"],
                &["naya", "shop"],
                &["दुकान", "जोड़ो"],
                &["दुकान", "बनाओ"],
                &["shop", "jodo"],
            ],
        },
        Rule {
            action: "get_shop",
            entity: Some("shop"),
            triggers: &[
                &["show", "shop"],
                &["shop", "details"],
                &["shop", "ki", "details"],
                &["दुकान", "की", "जानकारी"],
                &["view", "shop"],
            ],
        },
        Rule {
            action: "list_shops",
            entity: Some("shop"),
            triggers: &[
                &["list", "shops"],
                &["show", "shops"],
                &["browse", "shops"],
                &["shops", "dikhao"],
                &["दुकानें", "दिखाओ"],
                &["dukane", "dikhao"],
                &["sab", "shops"],
            ],
        },
        Rule {
            action: "get_platform_stats",
            entity: None,
            triggers: &[
                &["platform", "stats"],
                &["platform", "overview"],
                &["प्लेटफॉर्म", "स्टैट्स"],
                &["प्लेटफॉर्म", "आंकड़े"],
            ],
        },
        Rule {
            action: "get_shop_dashboard",
            entity: Some("shop"),
            triggers: &[
                &["dashboard"],
                &["डैशबोर्ड"],
                &["shop", "stats"],
                &["मेरी", "दुकान", "आंकड़े"],
                &["shop", "overview"],
            ],
        },
        Rule {
            action: "restock_product",
            entity: Some("product"),
            triggers: &[
                &["restock"],
                &["stock", "add"],
                &["add", "stock"],
                &["stock", "jodo"],
                &["स्टॉक", "जोड़ो"],
                &["stock", "badhao"],
                &["स्टॉक", "बढ़ाओ"],
                &["mein", "stock"],
            ],
        },
        Rule {
            action: "get_low_stock",
            entity: Some("product"),
            triggers: &[
                &["low", "stock"],
                &["कम", "स्टॉक"],
                &["stock", "khatam"],
                &["स्टॉक", "खत्म"],
                &["low", "inventory"],
            ],
        },
        Rule {
            action: "sell_at_price",
            entity: Some("order"),
            triggers: &[
                &["becho"],
                &["बेचो"],
                &["becha"],
                &["बेचा"],
                &["sell", "at"],
                &["sold", "at"],
                &["sell", "for"],
                &["sell", "product"],
            ],
        },
        Rule {
            action: "set_product_price",
            entity: Some("product"),
            triggers: &[
                &["set", "price"],
                &["change", "price"],
                &["price", "karo"],
                &["price", "update"],
                &["कीमत", "करो"],
                &["कीमत", "रखो"],
                &["कीमत", "बदलो"],
            ],
        },
        Rule {
            action: "delete_product",
            entity: Some("product"),
            triggers: &[
                &["delete", "product"],
                &["remove", "product"],
                &["product", "delete"],
                &["product", "hatao"],
                &["प्रोडक्ट", "हटाओ"],
                &["प्रोडक्ट", "निकालो"],
            ],
        },
        Rule {
            action: "search_customers",
            entity: Some("customer"),
            triggers: &[
                &["search", "customer"],
                &["find", "customer"],
                &["customer", "dhundho"],
                &["ग्राहक", "खोजो"],
                &["ग्राहक", "ढूंढो"],
            ],
        },
        Rule {
            action: "list_customers",
            entity: Some("customer"),
            triggers: &[
                &["list", "customers"],
                &["show", "customers"],
                &["customers", "dikhao"],
                &["ग्राहक", "दिखाओ"],
                &["sab", "customers"],
            ],
        },
        Rule {
            action: "generate_bill",
            entity: Some("order"),
            triggers: &[
                &["bill"],
                &["बिल"],
                &["रसीद"],
                &["receipt"],
            ],
        },
        Rule {
            action: "get_daily_profit",
            entity: None,
            triggers: &[
                &["aaj", "profit"],
                &["आज", "प्रॉफिट"],
                &["आज", "मुनाफा"],
                &["daily", "profit"],
                &["today", "profit"],
                &["profit", "report"],
            ],
        },
        Rule {
            action: "get_product_profit",
            entity: None,
            triggers: &[
                &["product", "profit"],
                &["profit", "by", "product"],
                &["product", "wise", "profit"],
                &["प्रोडक्ट", "प्रॉफिट"],
            ],
        },
        Rule {
            action: "get_profit_summary",
            entity: None,
            triggers: &[
                &["profit", "summary"],
                &["my", "profit"],
                &["mera", "profit"],
                &["मेरा", "प्रॉफिट"],
                &["कमाई"],
                &["earnings"],
                &["profit"],
                &["मुनाफा"],
                &["munafa"],
            ],
        },
        Rule {
            action: "confirm_order",
            entity: Some("order"),
            triggers: &[
                &["confirm", "order"],
                &["order", "confirm"],
                &["approve", "order"],
                &["ऑर्डर", "कन्फर्म"],
                &["ऑर्डर", "मंजूर"],
            ],
        },
        Rule {
            action: "ship_order",
            entity: Some("order"),
            triggers: &[
                &["ship", "order"],
                &["order", "ship"],
                &["ऑर्डर", "शिप"],
                &["order", "bhejo"],
                &["ऑर्डर", "भेजो"],
                &["dispatch", "order"],
            ],
        },
        Rule {
            action: "deliver_order",
            entity: Some("order"),
            triggers: &[
                &["deliver", "order"],
                &["order", "deliver"],
                &["ऑर्डर", "डिलीवर"],
                &["order", "complete"],
                &["ऑर्डर", "पहुंचा"],
            ],
        },
        Rule {
            action: "cancel_order",
            entity: Some("order"),
            triggers: &[
                &["cancel", "order"],
                &["order", "cancel"],
                &["ऑर्डर", "कैंसल"],
                &["ऑर्डर", "रद्द"],
            ],
        },
        Rule {
            action: "refund_order",
            entity: Some("order"),
            triggers: &[
                &["refund"],
                &["रिफंड"],
                &["paise", "wapas"],
                &["पैसे", "वापस"],
            ],
        },
        Rule {
            action: "update_order",
            entity: Some("order"),
            triggers: &[
                &["update", "order"],
                &["order", "update"],
                &["ऑर्डर", "अपडेट"],
                &["change", "order"],
            ],
        },
        Rule {
            action: "list_my_orders",
            entity: Some("order"),
            triggers: &[
                &["my", "orders"],
                &["mere", "orders"],
                &["मेरे", "ऑर्डर"],
                &["order", "history"],
            ],
        },
        Rule {
            action: "get_order",
            entity: Some("order"),
            triggers: &[
                &["track", "order"],
                &["order", "track"],
                &["order", "status"],
                &["show", "order"],
                &["ऑर्डर", "ट्रैक"],
                &["ऑर्डर", "कहां"],
                &["order", "details"],
            ],
        },
        Rule {
            action: "list_orders",
            entity: Some("order"),
            triggers: &[
                &["list", "orders"],
                &["show", "orders"],
                &["orders", "dikhao"],
                &["ऑर्डर्स", "दिखाओ"],
                &["सभी", "ऑर्डर्स"],
                &["sab", "orders"],
                &["aaj", "ke", "orders"],
            ],
        },
        Rule {
            action: "place_order",
            entity: Some("order"),
            triggers: &[
                &["buy"],
                &["purchase"],
                &["kharido"],
                &["खरीदो"],
                &["kharidna"],
                &["खरीदना"],
                &["order", "karo"],
                &["place", "order"],
                &["ऑर्डर", "करो"],
            ],
        },
        Rule {
            action: "search_products",
            entity: Some("product"),
            triggers: &[
                &["search"],
                &["find"],
                &["khojo"],
                &["खोजो"],
                &["dhundho"],
                &["ढूंढो"],
                &["सर्च"],
            ],
        },
        Rule {
            action: "list_products",
            entity: Some("product"),
            triggers: &[
                &["list", "products"],
                &["show", "products"],
                &["products", "dikhao"],
                &["प्रोडक्ट्स", "दिखाओ"],
                &["sab", "products"],
                &["products", "ki", "list"],
            ],
        },
        Rule {
            action: "list_users",
            entity: Some("user"),
            triggers: &[
                &["list", "users"],
                &["show", "users"],
                &["users", "dikhao"],
                &["यूज़र्स", "दिखाओ"],
                &["sab", "users"],
            ],
        },
        Rule {
            action: "list_shop_categories",
            entity: Some("category"),
            triggers: &[
                &["categories"],
                &["कैटेगरी"],
                &["business", "types"],
            ],
        },
    ]
}

/// Populate the limited parameters a pattern can carry. Returning `None`
/// rejects the rule (required capture absent) and resolution continues with
/// the next rule.
fn extract_parameters(action: &str, normalized: &str, raw: &str) -> Option<Map<String, Value>> {
    let mut params = Map::new();
    let integers = integers_in(normalized);

    match action {
        "verify_shop" | "suspend_shop" | "activate_shop" | "get_shop" | "delete_shop" => {
            let id = *integers.first()?;
            params.insert("shop_id".to_string(), Value::from(id));
        }
        "restock_product" => {
            let [product_id, quantity] = two_integers(&integers)?;
            params.insert("product_id".to_string(), Value::from(product_id));
            params.insert("quantity".to_string(), Value::from(quantity));
        }
        "set_product_price" => {
            let [product_id, price] = two_integers(&integers)?;
            params.insert("product_id".to_string(), Value::from(product_id));
            params.insert("price".to_string(), Value::from(price));
        }
        "sell_at_price" => {
            let [product_id, price] = two_integers(&integers)?;
            params.insert("product_id".to_string(), Value::from(product_id));
            params.insert("price".to_string(), Value::from(price));
            if let Some(quantity) = integers.get(2) {
                params.insert("quantity".to_string(), Value::from(*quantity));
            }
        }
        "delete_product" => {
            let id = *integers.first()?;
            params.insert("product_id".to_string(), Value::from(id));
        }
        "generate_bill" => {
            let id = *integers.first()?;
            params.insert("order_id".to_string(), Value::from(id));
            if normalized.contains("admin") {
                params.insert("bill_type".to_string(), Value::from("admin"));
            }
        }
        "get_daily_profit" | "get_product_profit" | "get_profit_summary"
        | "get_shop_dashboard" => {
            if let Some(id) = integers.first() {
                params.insert("shop_id".to_string(), Value::from(*id));
            }
        }
        "confirm_order" | "ship_order" | "deliver_order" | "cancel_order" | "refund_order"
        | "get_order" => {
            let id = *integers.first()?;
            params.insert("order_id".to_string(), Value::from(id));
        }
        "update_order" => {
            let [order_id, quantity] = two_integers(&integers)?;
            params.insert("order_id".to_string(), Value::from(order_id));
            params.insert("quantity".to_string(), Value::from(quantity));
        }
        "place_order" => {
            let id = *integers.first()?;
            params.insert("product_id".to_string(), Value::from(id));
            if let Some(quantity) = integers.get(1) {
                params.insert("quantity".to_string(), Value::from(*quantity));
            }
        }
        "search_products" | "search_customers" => {
            let query = extract_query(raw)?;
            params.insert("query".to_string(), Value::from(query));
        }
        "list_orders" | "get_shop_orders" => {
            if let Some(status) = status_word(normalized) {
                params.insert("status".to_string(), Value::from(status.as_str()));
            }
        }
        _ => {}
    }

    Some(params)
}

fn integers_in(text: &str) -> Vec<i64> {
    let mut integers = Vec::new();
    let mut current = String::new();
    for character in text.chars() {
        if character.is_ascii_digit() {
            current.push(character);
        } else if !current.is_empty() {
            if let Ok(value) = current.parse() {
                integers.push(value);
            }
            current.clear();
        }
    }
    if !current.is_empty() {
        if let Ok(value) = current.parse() {
            integers.push(value);
        }
    }
    integers
}

fn two_integers(integers: &[i64]) -> Option<[i64; 2]> {
    match integers {
        [first, second, ..] => Some([*first, *second]),
        _ => None,
    }
}

/// Free-text query: a quoted span when present, otherwise everything after
/// the trigger word minus filler.
fn extract_query(raw: &str) -> Option<String> {
    for quote in ['"', '\''] {
        let mut parts = raw.split(quote);
        parts.next();
        if let Some(quoted) = parts.next() {
            let quoted = quoted.trim();
            if !quoted.is_empty() {
                return Some(quoted.to_string());
            }
        }
    }

    const TRIGGERS: &[&str] = &["search", "find", "khojo", "खोजो", "dhundho", "ढूंढो", "सर्च"];
    const FILLER: &[&str] = &["for", "karo", "करो", "customers", "customer", "products", "product"];

    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let position = tokens
        .iter()
        .position(|token| TRIGGERS.iter().any(|trigger| token.to_lowercase().contains(trigger)))?;

    let query: Vec<&str> = tokens[position + 1..]
        .iter()
        .copied()
        .filter(|token| !FILLER.contains(&token.to_lowercase().as_str()))
        .collect();

    let query = query.join(" ");
    let query = query.trim();
    (!query.is_empty()).then(|| query.to_string())
}

fn status_word(normalized: &str) -> Option<OrderStatus> {
    const STATUS_WORDS: &[(&str, OrderStatus)] = &[
        ("pending", OrderStatus::Pending),
        ("पेंडिंग", OrderStatus::Pending),
        ("confirmed", OrderStatus::Confirmed),
        ("कन्फर्म", OrderStatus::Confirmed),
        ("shipped", OrderStatus::Shipped),
        ("शिप", OrderStatus::Shipped),
        ("delivered", OrderStatus::Delivered),
        ("डिलीवर", OrderStatus::Delivered),
        ("cancelled", OrderStatus::Cancelled),
        ("कैंसल", OrderStatus::Cancelled),
        ("रद्द", OrderStatus::Cancelled),
    ];

    STATUS_WORDS
        .iter()
        .find(|(word, _)| normalized.contains(word))
        .map(|(_, status)| *status)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::PatternResolver;

    #[test]
    fn hinglish_list_orders_resolves() {
        let resolver = PatternResolver::new();
        let intent = resolver.resolve("sab orders dikhao").expect("resolves");

        assert_eq!(intent.action, "list_orders");
        assert_eq!(intent.entity.as_deref(), Some("order"));
        assert!(intent.fallback);
        assert!(!intent.requires_confirmation);
    }

    #[test]
    fn hinglish_bargained_sale_captures_ids_and_price() {
        let resolver = PatternResolver::new();
        let intent = resolver.resolve("product 5 100 mein becho").expect("resolves");

        assert_eq!(intent.action, "sell_at_price");
        assert_eq!(intent.param("product_id"), Some(&json!(5)));
        assert_eq!(intent.param("price"), Some(&json!(100)));
    }

    #[test]
    fn destructive_actions_require_confirmation() {
        let resolver = PatternResolver::new();

        let delete = resolver.resolve("delete product 7").expect("resolves");
        assert_eq!(delete.action, "delete_product");
        assert!(delete.requires_confirmation);
        assert_eq!(delete.param("product_id"), Some(&json!(7)));

        let cancel = resolver.resolve("order 123 cancel karo").expect("resolves");
        assert_eq!(cancel.action, "cancel_order");
        assert!(cancel.requires_confirmation);

        let suspend = resolver.resolve("दुकान बंद करो 12").expect("resolves");
        assert_eq!(suspend.action, "suspend_shop");
        assert!(suspend.requires_confirmation);
        assert_eq!(suspend.param("shop_id"), Some(&json!(12)));
    }

    #[test]
    fn status_words_become_list_filters() {
        let resolver = PatternResolver::new();
        let intent = resolver.resolve("pending orders dikhao").expect("resolves");

        assert_eq!(intent.action, "list_orders");
        assert_eq!(intent.param("status"), Some(&json!("pending")));
    }

    #[test]
    fn missing_required_id_falls_through_to_a_broader_rule() {
        let resolver = PatternResolver::new();

        // "show order" wants an id; without one the orders listing wins.
        let intent = resolver.resolve("show orders").expect("resolves");
        assert_eq!(intent.action, "list_orders");

        let with_id = resolver.resolve("show order 55").expect("resolves");
        assert_eq!(with_id.action, "get_order");
        assert_eq!(with_id.param("order_id"), Some(&json!(55)));
    }

    #[test]
    fn search_query_captured_from_quotes_or_tail() {
        let resolver = PatternResolver::new();

        let quoted = resolver.resolve("search \"organic shampoo\"").expect("resolves");
        assert_eq!(quoted.action, "search_products");
        assert_eq!(quoted.param("query"), Some(&json!("organic shampoo")));

        let hinglish = resolver.resolve("dhundho लैपटॉप").expect("resolves");
        assert_eq!(hinglish.action, "search_products");
        assert_eq!(hinglish.param("query"), Some(&json!("लैपटॉप")));
    }

    #[test]
    fn gibberish_resolves_to_nothing() {
        let resolver = PatternResolver::new();
        assert!(resolver.resolve("abcd efgh ijkl").is_none());
    }

    #[test]
    fn handles_common_trilingual_phrases() {
        struct Case {
            text: &'static str,
            action: &'static str,
        }

        let cases = vec![
            Case { text: "show pending shops", action: "get_pending_shops" },
            Case { text: "pending shops dikhao", action: "get_pending_shops" },
            Case { text: "shop 5 verify karo", action: "verify_shop" },
            Case { text: "approve shop 12", action: "verify_shop" },
            Case { text: "shop 5 activate karo", action: "activate_shop" },
            Case { text: "add shop", action: "prefill_shop_form" },
            Case { text: "naya shop banao", action: "prefill_shop_form" },
            Case { text: "दुकान जोड़ो", action: "prefill_shop_form" },
            Case { text: "list shops", action: "list_shops" },
            Case { text: "सभी दुकानें दिखाओ", action: "list_shops" },
            Case { text: "platform stats dikhao", action: "get_platform_stats" },
            Case { text: "dashboard dikhao", action: "get_shop_dashboard" },
            Case { text: "restock product 5 add 100", action: "restock_product" },
            Case { text: "product 5 mein 100 stock add karo", action: "restock_product" },
            Case { text: "low stock dikhao", action: "get_low_stock" },
            Case { text: "कम स्टॉक दिखाओ", action: "get_low_stock" },
            Case { text: "sell product 5 at 100", action: "sell_at_price" },
            Case { text: "प्रोडक्ट 12 को 80 में बेचो", action: "sell_at_price" },
            Case { text: "product 5 ki price 50 karo", action: "set_product_price" },
            Case { text: "product 12 delete karo", action: "delete_product" },
            Case { text: "order 123 ka bill banao", action: "generate_bill" },
            Case { text: "make admin bill for order 789", action: "generate_bill" },
            Case { text: "aaj ka profit dikhao", action: "get_daily_profit" },
            Case { text: "आज का प्रॉफिट", action: "get_daily_profit" },
            Case { text: "product wise profit dikhao", action: "get_product_profit" },
            Case { text: "profit summary dikhao", action: "get_profit_summary" },
            Case { text: "मेरा प्रॉफिट", action: "get_profit_summary" },
            Case { text: "order 123 confirm karo", action: "confirm_order" },
            Case { text: "ship order 123", action: "ship_order" },
            Case { text: "ऑर्डर 456 भेजो", action: "ship_order" },
            Case { text: "order 123 deliver karo", action: "deliver_order" },
            Case { text: "cancel order 123", action: "cancel_order" },
            Case { text: "refund order 44", action: "refund_order" },
            Case { text: "update order 123 quantity 5", action: "update_order" },
            Case { text: "mere orders dikhao", action: "list_my_orders" },
            Case { text: "मेरे ऑर्डर्स दिखाओ", action: "list_my_orders" },
            Case { text: "track order 123", action: "get_order" },
            Case { text: "मेरा ऑर्डर 456 कहां है", action: "get_order" },
            Case { text: "list orders", action: "list_orders" },
            Case { text: "product 5 order karo 2 quantity", action: "place_order" },
            Case { text: "buy 3 of product 12", action: "place_order" },
            Case { text: "search karo मोबाइल", action: "search_products" },
            Case { text: "customer dhundho \"राम\"", action: "search_customers" },
            Case { text: "sab customers dikhao", action: "list_customers" },
            Case { text: "sab products dikhao", action: "list_products" },
            Case { text: "list users", action: "list_users" },
            Case { text: "categories dikhao", action: "list_shop_categories" },
        ];

        let resolver = PatternResolver::new();
        for (index, case) in cases.iter().enumerate() {
            let intent = resolver
                .resolve(case.text)
                .unwrap_or_else(|| panic!("case {index} should resolve: {}", case.text));
            assert_eq!(intent.action, case.action, "case {index}: {}", case.text);
            assert!(intent.fallback, "case {index} must be fallback-sourced");
        }
    }
}
