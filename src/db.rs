use anyhow::Result;
use sqlx::MySqlPool;

pub async fn init_db(database_url: &str) -> MySqlPool {
    MySqlPool::connect(database_url)
        .await
        .expect("Failed to connect to database")
}

/// Create the tables on startup if they do not exist yet, mirroring the
/// entity definitions in `model`.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS departments (
            id   BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(255)    NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id                 BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
            name               VARCHAR(255)    NOT NULL,
            position           VARCHAR(255)    NULL,
            salary             DOUBLE          NOT NULL DEFAULT 0,
            is_active          BOOLEAN         NOT NULL DEFAULT TRUE,
            hire_date          DATE            NOT NULL,
            last_activity_date DATETIME        NOT NULL,
            department_id      BIGINT UNSIGNED NOT NULL,
            CONSTRAINT fk_employees_department
                FOREIGN KEY (department_id) REFERENCES departments (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id          BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
            email       VARCHAR(255)    NOT NULL UNIQUE,
            password    VARCHAR(255)    NOT NULL,
            title       VARCHAR(255)    NULL,
            role        VARCHAR(16)     NOT NULL DEFAULT 'user',
            employee_id BIGINT UNSIGNED NOT NULL UNIQUE,
            CONSTRAINT fk_users_employee
                FOREIGN KEY (employee_id) REFERENCES employees (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
