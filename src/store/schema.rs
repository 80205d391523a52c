use sqlx::PgPool;

use crate::domain::pricing::TASA_RESPALDO;

// ============================================================================
// Schema - Idempotent Table, Seed and Trigger Creation
// ============================================================================
//
// Run once at startup, before the actors come up. The pg_notify triggers
// feed the change-feed listener; payloads carry only {tabla, op} because
// consumers reload the whole affected list instead of merging row diffs.
//
// ============================================================================

const TABLAS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS platillos (
        id UUID PRIMARY KEY,
        nombre TEXT NOT NULL,
        precio_usd NUMERIC(12,2) NOT NULL,
        descripcion TEXT,
        imagen_url TEXT,
        activo BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pedidos (
        id UUID PRIMARY KEY,
        cliente_nombre TEXT NOT NULL,
        cliente_direccion TEXT,
        items JSONB NOT NULL,
        total_usd NUMERIC(12,2) NOT NULL,
        total_bs NUMERIC(14,2) NOT NULL,
        tasa_dolar_usada NUMERIC(12,2) NOT NULL,
        estado TEXT NOT NULL,
        monto_abonado_usd NUMERIC(12,2) NOT NULL DEFAULT 0,
        monto_abonado_bs NUMERIC(14,2) NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS abonos_pedido (
        id UUID PRIMARY KEY,
        pedido_id UUID NOT NULL REFERENCES pedidos(id) ON DELETE CASCADE,
        monto_usd NUMERIC(12,2) NOT NULL,
        monto_bs NUMERIC(14,2) NOT NULL,
        tasa_dolar_usada NUMERIC(12,2) NOT NULL,
        metodo_pago TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS configuracion (
        clave TEXT PRIMARY KEY,
        valor TEXT NOT NULL
    )
    "#,
];

const FUNCION_NOTIFICAR: &str = r#"
CREATE OR REPLACE FUNCTION comanda_notificar_cambio() RETURNS trigger AS $$
BEGIN
    PERFORM pg_notify(
        TG_TABLE_NAME || '_cambios',
        json_build_object('tabla', TG_TABLE_NAME, 'op', TG_OP)::text
    );
    RETURN NULL;
END;
$$ LANGUAGE plpgsql
"#;

/// Tables whose changes are pushed to subscribed clients.
pub const TABLAS_CON_FEED: &[&str] = &["platillos", "pedidos", "configuracion"];

pub async fn inicializar(pool: &PgPool) -> anyhow::Result<()> {
    tracing::info!("Inicializando esquema de base de datos");

    for ddl in TABLAS {
        sqlx::query(ddl).execute(pool).await?;
    }

    // Seed the rate row so a fresh database prices like the clients do
    sqlx::query(
        "INSERT INTO configuracion (clave, valor) VALUES ($1, $2) \
         ON CONFLICT (clave) DO NOTHING",
    )
    .bind(crate::store::configuracion::CLAVE_TASA)
    .bind(TASA_RESPALDO.to_string())
    .execute(pool)
    .await?;

    sqlx::query(FUNCION_NOTIFICAR).execute(pool).await?;

    for tabla in TABLAS_CON_FEED {
        let drop = format!("DROP TRIGGER IF EXISTS {tabla}_notificar ON {tabla}");
        sqlx::query(&drop).execute(pool).await?;

        let create = format!(
            "CREATE TRIGGER {tabla}_notificar \
             AFTER INSERT OR UPDATE OR DELETE ON {tabla} \
             FOR EACH ROW EXECUTE FUNCTION comanda_notificar_cambio()"
        );
        sqlx::query(&create).execute(pool).await?;
    }

    tracing::info!("✅ Esquema listo");
    Ok(())
}
