use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_users_table::Migration),
            Box::new(m20240301_000002_create_customers_table::Migration),
            Box::new(m20240301_000003_create_products_table::Migration),
            Box::new(m20240301_000004_create_orders_table::Migration),
            Box::new(m20240301_000005_create_order_items_table::Migration),
            Box::new(m20240301_000006_create_supplier_orders_table::Migration),
            Box::new(m20240301_000007_create_supplier_order_items_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Users::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_users_email")
                        .table(Users::Table)
                        .col(Users::Email)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        Email,
        Name,
        PasswordHash,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_customers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_customers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::UserId).uuid().not_null())
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Phone).string().not_null())
                        .col(ColumnDef::new(Customers::Email).string())
                        .col(ColumnDef::new(Customers::Address).string())
                        .col(ColumnDef::new(Customers::Notes).string())
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customers_user_id")
                                .from(Customers::Table, Customers::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_customers_user_id")
                        .table(Customers::Table)
                        .col(Customers::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Customers {
        Table,
        Id,
        UserId,
        Name,
        Phone,
        Email,
        Address,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
    }
}

mod m20240301_000003_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::UserId).uuid().not_null())
                        .col(ColumnDef::new(Products::Code).string().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Category).string().not_null())
                        .col(ColumnDef::new(Products::Range).string().not_null())
                        .col(ColumnDef::new(Products::Equivalence).string())
                        .col(
                            ColumnDef::new(Products::CostPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::SellPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::StockQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::AllowNegativeStock)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Products::Size).string())
                        .col(ColumnDef::new(Products::Notes).string())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_user_id")
                                .from(Products::Table, Products::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // One catalog code per user
            manager
                .create_index(
                    Index::create()
                        .name("idx_products_user_id_code")
                        .table(Products::Table)
                        .col(Products::UserId)
                        .col(Products::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
        UserId,
        Code,
        Name,
        Category,
        Range,
        Equivalence,
        CostPrice,
        SellPrice,
        StockQuantity,
        AllowNegativeStock,
        Size,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
    }
}

mod m20240301_000004_create_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                        .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Status).string_len(16).not_null())
                        .col(
                            ColumnDef::new(Orders::OrderDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::TotalProfit)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_user_id")
                                .from(Orders::Table, Orders::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_customer_id")
                                .from(Orders::Table, Orders::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_user_id")
                        .table(Orders::Table)
                        .col(Orders::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_customer_id")
                        .table(Orders::Table)
                        .col(Orders::CustomerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        UserId,
        CustomerId,
        Status,
        OrderDate,
        TotalAmount,
        TotalProfit,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
    }

    #[derive(Iden)]
    enum Customers {
        Table,
        Id,
    }
}

mod m20240301_000005_create_order_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::Subtotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_product_id")
                                .from(OrderItems::Table, OrderItems::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        Quantity,
        UnitPrice,
        Subtotal,
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
    }
}

mod m20240301_000006_create_supplier_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_supplier_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SupplierOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierOrders::UserId).uuid().not_null())
                        .col(ColumnDef::new(SupplierOrders::OrderNumber).string())
                        .col(
                            ColumnDef::new(SupplierOrders::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::OrderDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::ExpectedDate)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::ReceivedDate)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::TotalAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierOrders::Notes).string())
                        .col(
                            ColumnDef::new(SupplierOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::UpdatedAt).timestamp_with_time_zone(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_orders_user_id")
                                .from(SupplierOrders::Table, SupplierOrders::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_supplier_orders_user_id")
                        .table(SupplierOrders::Table)
                        .col(SupplierOrders::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SupplierOrders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum SupplierOrders {
        Table,
        Id,
        UserId,
        OrderNumber,
        Status,
        OrderDate,
        ExpectedDate,
        ReceivedDate,
        TotalAmount,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
    }
}

mod m20240301_000007_create_supplier_order_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000007_create_supplier_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SupplierOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierOrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrderItems::SupplierOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierOrderItems::ProductId).uuid())
                        .col(
                            ColumnDef::new(SupplierOrderItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrderItems::UnitCost)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_order_items_supplier_order_id")
                                .from(
                                    SupplierOrderItems::Table,
                                    SupplierOrderItems::SupplierOrderId,
                                )
                                .to(SupplierOrders::Table, SupplierOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_order_items_product_id")
                                .from(SupplierOrderItems::Table, SupplierOrderItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_supplier_order_items_supplier_order_id")
                        .table(SupplierOrderItems::Table)
                        .col(SupplierOrderItems::SupplierOrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SupplierOrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum SupplierOrderItems {
        Table,
        Id,
        SupplierOrderId,
        ProductId,
        Quantity,
        UnitCost,
    }

    #[derive(Iden)]
    enum SupplierOrders {
        Table,
        Id,
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
    }
}
