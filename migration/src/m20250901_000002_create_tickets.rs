use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Zones {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum DrawTypes {
    Table,
    Id,
}

/// 彩票头
#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    ZoneId,
    DrawTypeId,
    SellerId,
    TotalPieces,
    SaleDate,
    CreatedAt,
}

/// 彩票明细（号码 x 份数）
#[derive(DeriveIden)]
enum TicketItems {
    Table,
    Id,
    TicketId,
    Number,
    Pieces,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tickets::ZoneId).big_integer().not_null())
                    .col(ColumnDef::new(Tickets::DrawTypeId).big_integer().not_null())
                    .col(ColumnDef::new(Tickets::SellerId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Tickets::TotalPieces)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Tickets::TotalPieces).gte(0)),
                    )
                    // 区域本地日期，累计上限与报表均按此字段
                    .col(ColumnDef::new(Tickets::SaleDate).date().not_null())
                    .col(
                        ColumnDef::new(Tickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    // 已被彩票引用的区域/开奖类型不允许物理删除
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_zone")
                            .from(Tickets::Table, Tickets::ZoneId)
                            .to(Zones::Table, Zones::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_draw_type")
                            .from(Tickets::Table, Tickets::DrawTypeId)
                            .to(DrawTypes::Table, DrawTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tickets_zone_draw_date")
                    .table(Tickets::Table)
                    .col(Tickets::ZoneId)
                    .col(Tickets::DrawTypeId)
                    .col(Tickets::SaleDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tickets_seller")
                    .table(Tickets::Table)
                    .col(Tickets::SellerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TicketItems::TicketId).big_integer().not_null())
                    .col(ColumnDef::new(TicketItems::Number).char_len(2).not_null())
                    .col(
                        ColumnDef::new(TicketItems::Pieces)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(TicketItems::Pieces).gt(0)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_items_ticket")
                            .from(TicketItems::Table, TicketItems::TicketId)
                            .to(Tickets::Table, Tickets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一张彩票内号码唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ticket_items_ticket_number_unique")
                    .table(TicketItems::Table)
                    .col(TicketItems::TicketId)
                    .col(TicketItems::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(TicketItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Tickets::Table).to_owned())
            .await?;
        Ok(())
    }
}
