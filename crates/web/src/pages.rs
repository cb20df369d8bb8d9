//! Minimal server-rendered form, the only UI the system has.

/// Renders the lookup page. `cedula` echoes the submitted value back into
/// the form; `error` is the single aggregated summary of an aborted run.
pub fn render(cedula: &str, error: Option<&str>) -> String {
    let error_block = match error {
        Some(message) => format!(
            "<p class=\"error\">{}</p>",
            escape(message)
        ),
        None => String::new(),
    };
    format!(
        r#"<!doctype html>
<html lang="es">
<head>
  <meta charset="utf-8">
  <title>Consulta por cédula</title>
  <style>
    body {{ font-family: sans-serif; max-width: 40rem; margin: 3rem auto; }}
    .error {{ color: #b00020; white-space: pre-wrap; }}
  </style>
</head>
<body>
  <h1>Consulta por cédula</h1>
  <form method="post" action="/">
    <label for="cedula">Número de cédula</label>
    <input id="cedula" name="cedula" value="{cedula}" autofocus>
    <button type="submit">Consultar</button>
  </form>
  {error_block}
</body>
</html>
"#,
        cedula = escape(cedula),
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_the_submitted_cedula() {
        let page = render("0102030405", None);
        assert!(page.contains("value=\"0102030405\""));
        assert!(!page.contains("class=\"error\""));
    }

    #[test]
    fn shows_the_error_summary_when_present() {
        let page = render("0102030405", Some("Error al consultar: browser session lost"));
        assert!(page.contains("class=\"error\""));
        assert!(page.contains("browser session lost"));
    }

    #[test]
    fn escapes_markup_in_inputs() {
        let page = render("<script>", Some("a & b < c"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("a &amp; b &lt; c"));
        assert!(!page.contains("<script>"));
    }
}
