//! The built-in portal sequence and optional file-based overrides.
//!
//! Everything here is configuration, not logic: each record must mirror
//! the live portal's DOM exactly for behavior parity, and updating a
//! selector when a portal redesigns is a data change only.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::step::{Selector, SiteDefinition};

/// The five portals queried on every run, in fixed order.
///
/// The first entry is the only one that closes its own landing tab once
/// the result document opens; every later portal leaves all prior tabs in
/// place. Senescyt carries the long outlier timeout because its field is
/// gated behind a visual challenge the operator solves by hand.
pub fn builtin_sites() -> Vec<SiteDefinition> {
    vec![
        SiteDefinition {
            name: "Función Judicial (antecedentes penales)".to_string(),
            url: "https://consultas.funcionjudicial.gob.ec/informacionjudicialindividual/pages/index.jsf".to_string(),
            ready: Selector::Css("body".to_string()),
            setup: vec![Selector::XPath("//md-radio-button[@value='cedula']".to_string())],
            field: Selector::Id("input_3".to_string()),
            submit: Selector::XPath(
                "//button[@ng-click='vmAntecedente.buscarAntecedentePenal()']".to_string(),
            ),
            follow_up: Some(Selector::XPath(
                "//button[@ng-click='vmAntecedente.imprimirReporte()']".to_string(),
            )),
            opens_tab: true,
            close_own_tab: true,
            page_timeout_secs: 60,
            element_timeout_secs: 30,
        },
        SiteDefinition {
            name: "SRI (deudas firmes)".to_string(),
            url: "https://srienlinea.sri.gob.ec/sri-en-linea/SriPagosWeb/ConsultaDeudas/Consultas/consultaDeudas".to_string(),
            ready: Selector::Css("body".to_string()),
            setup: Vec::new(),
            field: Selector::Css("input[name='identificacion']".to_string()),
            submit: Selector::Css("button[type='submit']".to_string()),
            follow_up: None,
            opens_tab: false,
            close_own_tab: false,
            page_timeout_secs: 60,
            element_timeout_secs: 30,
        },
        SiteDefinition {
            name: "ANT (puntos de licencia)".to_string(),
            url: "https://consultaweb.ant.gob.ec/PortalWEB/paginas/clientes/clp_criterio_consulta.jsp".to_string(),
            ready: Selector::Css("body".to_string()),
            setup: Vec::new(),
            field: Selector::Id("ps_identificacion".to_string()),
            submit: Selector::XPath("//input[@value='Buscar']".to_string()),
            follow_up: None,
            opens_tab: false,
            close_own_tab: false,
            page_timeout_secs: 60,
            element_timeout_secs: 30,
        },
        SiteDefinition {
            name: "Senescyt (títulos registrados)".to_string(),
            url: "https://www.senescyt.gob.ec/consulta-titulos-web/faces/vista/consulta/consulta.xhtml".to_string(),
            ready: Selector::Id("formPrincipal".to_string()),
            setup: Vec::new(),
            field: Selector::Id("formPrincipal:identificacion".to_string()),
            submit: Selector::Id("formPrincipal:boton-buscar".to_string()),
            follow_up: None,
            opens_tab: false,
            close_own_tab: false,
            page_timeout_secs: 60,
            // The portal shows a captcha before the search is allowed; the
            // operator solves it by hand while this wait is running.
            element_timeout_secs: 600,
        },
        SiteDefinition {
            name: "CNE (lugar de votación)".to_string(),
            url: "https://consultas.cne.gob.ec/lugar-votacion".to_string(),
            ready: Selector::Css("body".to_string()),
            setup: Vec::new(),
            field: Selector::Id("cedula".to_string()),
            submit: Selector::Id("btn-consultar".to_string()),
            follow_up: None,
            opens_tab: true,
            close_own_tab: false,
            page_timeout_secs: 60,
            element_timeout_secs: 30,
        },
    ]
}

/// Loads a replacement site sequence from a JSON array of definitions.
pub fn sites_from_file(path: &Path) -> Result<Vec<SiteDefinition>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}
