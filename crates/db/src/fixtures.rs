//! Deterministic demo dataset for local runs and end-to-end checks.

use crate::DbPool;

pub struct SeedDataset;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub shops: u32,
    pub products: u32,
    pub orders: u32,
}

#[derive(Clone, Debug)]
pub struct SeedVerification {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl SeedDataset {
    /// Idempotent: clears previously seeded rows and reloads the dataset.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, sqlx::Error> {
        let mut tx = pool.begin().await?;

        for table in ["orders", "products", "users", "customers", "shops", "shop_categories"] {
            sqlx::query(&format!("DELETE FROM {table}")).execute(&mut *tx).await?;
        }

        sqlx::query(
            "INSERT INTO shop_categories (id, name, description, icon) VALUES \
             (1, 'Kirana & Grocery', 'Daily essentials and staples', 'store'), \
             (2, 'Electronics', 'Phones, accessories and appliances', 'cpu')",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO shops (id, name, category_id, owner_name, owner_email, city, is_verified, is_active) VALUES \
             (1, 'Sharma General Store', 1, 'Ramesh Sharma', 'ramesh@sharmastore.in', 'Jaipur', 1, 1), \
             (2, 'Galaxy Mobiles', 2, 'Imran Khan', 'imran@galaxymobiles.in', 'Mumbai', 0, 1)",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO products (id, shop_id, name, sku, price, cost_price, min_price, quantity, min_stock_level) VALUES \
             (1, 1, 'Basmati Rice 5kg', 'RICE-5KG', '600', '400', '500', 40, 10), \
             (2, 1, 'Fortune Sunflower Oil 1L', 'OIL-1L', '150', '120', '130', 25, 10), \
             (3, 1, 'Tata Salt 1kg', 'SALT-1KG', '28', '22', NULL, 8, 10), \
             (4, 2, 'USB-C Charger 25W', 'CHG-25W', '999', '650', '750', 15, 5), \
             (5, 2, 'Bluetooth Earbuds', 'EAR-BT', '1999', '1400', NULL, 3, 5)",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO customers (id, name, email, phone) VALUES \
             (1, 'Meera Patel', 'meera@example.com', '9876543210'), \
             (2, 'Arjun Verma', 'arjun@example.com', '9812345678')",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO users (id, name, email, role, shop_id) VALUES \
             (1, 'Platform Root', 'root@kirana.in', 'super_admin', NULL), \
             (2, 'Ramesh Sharma', 'ramesh@sharmastore.in', 'admin', 1), \
             (3, 'Meera Patel', 'meera@example.com', 'customer', NULL)",
        )
        .execute(&mut *tx)
        .await?;

        // One full-price sale and one bargained sale with its discount and
        // profit captured in the snapshot columns.
        sqlx::query(
            "INSERT INTO orders (id, shop_id, product_id, product_name, quantity, cost_price, \
             listed_price, final_price, unit_price, total_amount, total_cost, profit, \
             discount_given, status, customer_name, customer_email) VALUES \
             (1, 1, 1, 'Basmati Rice 5kg', 1, '400', '600', '600', '600', '600', '400', '200', '0', 'delivered', 'Meera Patel', 'meera@example.com'), \
             (2, 1, 2, 'Fortune Sunflower Oil 1L', 2, '120', '150', '140', '140', '280', '240', '40', '20', 'pending', 'Arjun Verma', 'arjun@example.com')",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SeedResult { shops: 2, products: 5, orders: 2 })
    }

    pub async fn verify(pool: &DbPool) -> Result<SeedVerification, sqlx::Error> {
        let mut checks = Vec::new();

        let shop_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shops").fetch_one(pool).await?;
        checks.push(("shops-present", shop_count == 2));

        let product_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(pool).await?;
        checks.push(("products-present", product_count == 5));

        let low_stock: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE quantity <= min_stock_level",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("low-stock-rows", low_stock == 2));

        let bargained: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE CAST(discount_given AS REAL) > 0",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("bargained-order", bargained == 1));

        let pending_shop: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shops WHERE is_verified = 0")
                .fetch_one(pool)
                .await?;
        checks.push(("pending-shop", pending_shop == 1));

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(SeedVerification { all_present, checks })
    }
}
