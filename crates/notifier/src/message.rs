use chrono::{DateTime, TimeZone};

/// Date/time layout used in the welcome text (es-ES convention).
const DATE_TIME_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Build the welcome/help text sent to a member of `group_name`.
pub fn compose_welcome<Tz>(group_name: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "Hola, soy un subbot. Puedes usar mis comandos con .help\n\
         Grupo: {}\n\
         Fecha y hora: {}",
        group_name,
        at.format(DATE_TIME_FORMAT)
    )
}
