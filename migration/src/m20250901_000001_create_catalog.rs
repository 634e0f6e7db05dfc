use sea_orm_migration::prelude::*;

/// 销售区域
#[derive(DeriveIden)]
enum Zones {
    Table,
    Id,
    Name,
    Description,
    TimeZone,
    IsActive,
    CreatedAt,
}

/// 开奖类型（玩法）
#[derive(DeriveIden)]
enum DrawTypes {
    Table,
    Id,
    Code,
    Name,
    IsActive,
    CreatedAt,
}

/// 区域 + 开奖类型 的截止时间配置
#[derive(DeriveIden)]
enum DrawSchedules {
    Table,
    Id,
    ZoneId,
    DrawTypeId,
    CutoffTime,
    IsActive,
    UpdatedAt,
}

/// 区域 + 开奖类型 + 号码 的每日累计上限
#[derive(DeriveIden)]
enum NumberLimits {
    Table,
    Id,
    ZoneId,
    DrawTypeId,
    Number,
    MaxPieces,
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
                    .table(Zones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Zones::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Zones::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Zones::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    // NULL = 使用配置中的默认时区
                    .col(ColumnDef::new(Zones::TimeZone).string_len(64).null())
                    .col(
                        ColumnDef::new(Zones::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Zones::CreatedAt)
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
                    .name("idx_zones_name_unique")
                    .table(Zones::Table)
                    .col(Zones::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DrawTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DrawTypes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DrawTypes::Code).string_len(30).not_null())
                    .col(ColumnDef::new(DrawTypes::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(DrawTypes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DrawTypes::CreatedAt)
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
                    .name("idx_draw_types_code_unique")
                    .table(DrawTypes::Table)
                    .col(DrawTypes::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DrawSchedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DrawSchedules::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DrawSchedules::ZoneId).big_integer().not_null())
                    .col(
                        ColumnDef::new(DrawSchedules::DrawTypeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DrawSchedules::CutoffTime).time().not_null())
                    .col(
                        ColumnDef::new(DrawSchedules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DrawSchedules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draw_schedules_zone")
                            .from(DrawSchedules::Table, DrawSchedules::ZoneId)
                            .to(Zones::Table, Zones::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draw_schedules_draw_type")
                            .from(DrawSchedules::Table, DrawSchedules::DrawTypeId)
                            .to(DrawTypes::Table, DrawTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个 (zone, draw_type) 最多一条
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_schedules_zone_draw_unique")
                    .table(DrawSchedules::Table)
                    .col(DrawSchedules::ZoneId)
                    .col(DrawSchedules::DrawTypeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NumberLimits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NumberLimits::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NumberLimits::ZoneId).big_integer().not_null())
                    .col(
                        ColumnDef::new(NumberLimits::DrawTypeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(NumberLimits::Number).char_len(2).not_null())
                    // 0 = 该号码禁止销售
                    .col(
                        ColumnDef::new(NumberLimits::MaxPieces)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(NumberLimits::MaxPieces).gte(0)),
                    )
                    .col(
                        ColumnDef::new(NumberLimits::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_number_limits_zone")
                            .from(NumberLimits::Table, NumberLimits::ZoneId)
                            .to(Zones::Table, Zones::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_number_limits_draw_type")
                            .from(NumberLimits::Table, NumberLimits::DrawTypeId)
                            .to(DrawTypes::Table, DrawTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_number_limits_zone_draw_number_unique")
                    .table(NumberLimits::Table)
                    .col(NumberLimits::ZoneId)
                    .col(NumberLimits::DrawTypeId)
                    .col(NumberLimits::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 初始化演示数据：一个区域、两种开奖、对应截止时间与两个号码上限
        let conn = manager.get_connection();
        let seed_sql = r#"
INSERT INTO zones (name, description) VALUES ('Managua', 'Zona central') ON CONFLICT (name) DO NOTHING;
INSERT INTO draw_types (code, name) VALUES
 ('manana', 'Sorteo 11 AM'),
 ('noche', 'Sorteo 9 PM')
ON CONFLICT (code) DO NOTHING;
INSERT INTO draw_schedules (zone_id, draw_type_id, cutoff_time)
SELECT z.id, d.id, CASE d.code WHEN 'manana' THEN TIME '10:45' ELSE TIME '20:45' END
FROM zones z CROSS JOIN draw_types d
WHERE z.name = 'Managua'
ON CONFLICT (zone_id, draw_type_id) DO NOTHING;
INSERT INTO number_limits (zone_id, draw_type_id, number, max_pieces)
SELECT z.id, d.id, n.number, n.max_pieces
FROM zones z CROSS JOIN draw_types d
CROSS JOIN (VALUES ('00', 50), ('13', 20)) AS n(number, max_pieces)
WHERE z.name = 'Managua'
ON CONFLICT (zone_id, draw_type_id, number) DO NOTHING;
"#;
        conn.execute_unprepared(seed_sql).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：上限 -> 截止时间 -> 开奖类型 -> 区域
        manager
            .drop_table(Table::drop().if_exists().table(NumberLimits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(DrawSchedules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(DrawTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Zones::Table).to_owned())
            .await?;
        Ok(())
    }
}
