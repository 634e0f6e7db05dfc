use sea_orm_migration::prelude::*;

/// 每日号码累计销量计数器
///
/// 每个 (zone, draw_type, number, sale_date) 一行，出票时在同一事务内做条件自增
/// (`pieces_sold + n <= max_pieces`)，保证并发下累计不会超过上限。
#[derive(DeriveIden)]
enum NumberSales {
    Table,
    Id,
    ZoneId,
    DrawTypeId,
    Number,
    SaleDate,
    PiecesSold,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NumberSales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NumberSales::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NumberSales::ZoneId).big_integer().not_null())
                    .col(
                        ColumnDef::new(NumberSales::DrawTypeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(NumberSales::Number).char_len(2).not_null())
                    .col(ColumnDef::new(NumberSales::SaleDate).date().not_null())
                    .col(
                        ColumnDef::new(NumberSales::PiecesSold)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(NumberSales::PiecesSold).gte(0)),
                    )
                    .col(
                        ColumnDef::new(NumberSales::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_number_sales_key_unique")
                    .table(NumberSales::Table)
                    .col(NumberSales::ZoneId)
                    .col(NumberSales::DrawTypeId)
                    .col(NumberSales::Number)
                    .col(NumberSales::SaleDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(NumberSales::Table).to_owned())
            .await?;
        Ok(())
    }
}
