//! 商品目录抽取 schema
//!
//! 文档 AI 服务按此 schema 返回结构化数据。核心流程不解析它，只原样透传。

use serde_json::{json, Value};

/// 商品字段及其在摘要中的显示名称（按显示顺序）
pub const PRODUCT_FIELDS: &[(&str, &str)] = &[
    ("id", "ID"),
    ("name", "Name"),
    ("size", "Size"),
    ("price", "Price"),
    ("flower-data", "Flower Data"),
    ("foliage-data", "Foliage Data"),
    ("dimensions", "Dimensions"),
    ("construction-material", "Construction Material"),
];

/// 内置的花艺商品目录 schema
pub fn product_catalog_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "API Response for Products",
        "description": "A schema for a list of products returned from an API, representing ALL floral arrangements (S, M, L sizes) extracted from the markdown document.",
        "type": "object",
        "properties": {
            "products": {
                "title": "Product List",
                "description": "An array of product objects, each representing a specific floral arrangement in ALL available sizes (S, M, L). Extract each size as a separate product with the appropriate size suffix in the ID.",
                "type": "array",
                "items": {
                    "type": "object",
                    "title": "Product",
                    "description": "A single product (floral arrangement) with its details for a specific size.",
                    "properties": {
                        "id": {
                            "type": "string",
                            "title": "Product ID",
                            "description": "Unique identifier for the product with size suffix, such as '197766S', '197766M', '197766L'."
                        },
                        "name": {
                            "type": "string",
                            "title": "Product Name",
                            "description": "Name of the product, such as 'Petal Palooza' or 'Field Study'."
                        },
                        "size": {
                            "type": "string",
                            "title": "Product Size",
                            "description": "Size of the product (S, M, or L).",
                            "enum": ["S", "M", "L"]
                        },
                        "price": {
                            "type": "number",
                            "title": "Product Price",
                            "description": "Suggested retail price of the product in USD for this specific size."
                        },
                        "flower-data": {
                            "type": "string",
                            "title": "Flower Data",
                            "description": "Type and number of flowers in the arrangement for this specific size, e.g., '2 stems Hydrangea - Blue, 4 stems Carnation - Orange'."
                        },
                        "foliage-data": {
                            "type": "string",
                            "title": "Foliage Data",
                            "description": "Type and number of foliage in the arrangement for this specific size, e.g., '3 stems Tree Fern - Painted, 1 stem Eucalyptus - Gunni'."
                        },
                        "dimensions": {
                            "type": "string",
                            "title": "Dimensions",
                            "description": "Dimensions of the arrangement for this specific size, e.g., 'Arrangement Height 11\", Length 10\"'."
                        },
                        "construction-material": {
                            "type": "string",
                            "description": "description of the construction material eg 6\" gathering vase - clear"
                        }
                    },
                    "required": [
                        "id",
                        "name",
                        "size",
                        "price",
                        "flower-data",
                        "foliage-data",
                        "dimensions",
                        "construction-material"
                    ]
                }
            }
        },
        "required": ["products"]
    })
}

/// 字段显示名称；未知字段按 `a-b_c` → `A B C` 生成
pub fn field_label(key: &str) -> String {
    if let Some((_, label)) = PRODUCT_FIELDS.iter().find(|(k, _)| *k == key) {
        return label.to_string();
    }

    key.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
