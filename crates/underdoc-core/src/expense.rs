use serde::{Deserialize, Serialize};

use crate::image::ImageFormat;

/// Request body for `POST {endpoint}/expenses/extract`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub image_format: ImageFormat,
    /// Base64 encoded image bytes.
    pub image_data: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ExpenseImageType {
    Receipt,
    Invoice,
    Others,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpenseItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub subtotal: Option<f64>,
}

/// Expense details. Every field is optional since extraction confidence varies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    #[serde(default)]
    pub shop_name: Option<String>,
    #[serde(default)]
    pub shop_address: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub expense_category: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub items: Option<Vec<ExpenseItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseData {
    pub image_type: ExpenseImageType,
    #[serde(default)]
    pub expense: Option<Expense>,
}

/// Successful response body of the extraction endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionResponse {
    pub receipt_data: ExpenseData,
}
