// Column names of the sales log as they appear in the file header.

pub const ORDER_ID: &str = "id_pedido";
pub const CUSTOMER_ID: &str = "id_cliente";

pub const CHANNEL: &str = "canal_venda";
pub const PRODUCT_TYPE: &str = "tipo_produto";
pub const PRODUCT: &str = "produto";
pub const PAYMENT_METHOD: &str = "forma_pagamento";
pub const REGION: &str = "regiao";
pub const CUSTOMER_SEX: &str = "sexo_cliente";

pub const UNIT_COST: &str = "custo_unitario";
pub const TOTAL_COST: &str = "custo_total";
pub const UNIT_PRICE: &str = "valor_unitario";
pub const SUBTOTAL: &str = "sub_total";
pub const DISCOUNT: &str = "desconto_aplicado";
pub const FREIGHT: &str = "valor_frete";
pub const TOTAL_VALUE: &str = "valor_total";
pub const UNIT_PROFIT: &str = "lucro_unitario";
pub const TOTAL_PROFIT: &str = "lucro_total";
pub const FIXED_MARGIN: &str = "margem_lucro_fixada";
pub const DISCOUNT_PCT: &str = "percentual_desconto_aplicado";
pub const REAL_MARGIN: &str = "margem_lucro_real";

pub const ORDER_DATE: &str = "data_pedido";
/// Derived from [`ORDER_DATE`] during normalization.
pub const YEAR: &str = "ano";
/// Derived from [`ORDER_DATE`] during normalization.
pub const MONTH: &str = "mes";

pub const DELIVERED: &str = "produto_entregue";
pub const REPEAT_CUSTOMER: &str = "cliente_reincidente";
pub const RATING: &str = "avaliacao_cliente";

/// Fields stored as locale-formatted decimal text in the raw file.
pub const MONETARY_FIELDS: [&str; 12] = [
    UNIT_COST,
    TOTAL_COST,
    UNIT_PRICE,
    SUBTOTAL,
    DISCOUNT,
    FREIGHT,
    TOTAL_VALUE,
    UNIT_PROFIT,
    TOTAL_PROFIT,
    FIXED_MARGIN,
    DISCOUNT_PCT,
    REAL_MARGIN,
];

/// Key business indicators correlated against each other.
pub const KEY_INDICATORS: [&str; 5] = [TOTAL_VALUE, TOTAL_PROFIT, DISCOUNT, FREIGHT, RATING];
