//! Scripted in-memory sessions for engine tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use entidades_shared::config::RunConfig;
use entidades_shared::error::{EntidadesError, Result};
use entidades_shared::session::{SelectorOutcome, Session, SessionFactory};

/// Scripted behavior for one URL.
#[derive(Clone)]
pub enum PageScript {
    /// Navigation succeeds and renders this document.
    Html(String),
    /// Navigation always fails.
    Unreachable,
    /// Navigation fails `failures_left` times, then renders the document.
    Flaky { failures_left: u32, html: String },
}

impl PageScript {
    pub fn html(html: String) -> Self {
        Self::Html(html)
    }

    pub fn flaky(failures: u32, html: String) -> Self {
        Self::Flaky {
            failures_left: failures,
            html,
        }
    }
}

/// In-memory session over a url → script map.
pub struct FakeSession {
    scripts: HashMap<String, PageScript>,
    current: Option<String>,
    visits: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl FakeSession {
    pub fn new(scripts: Vec<(String, PageScript)>) -> Self {
        Self::from_map(scripts.into_iter().collect())
    }

    fn from_map(scripts: HashMap<String, PageScript>) -> Self {
        Self {
            scripts,
            current: None,
            visits: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared navigation log, in visit order.
    pub fn visit_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.visits)
    }

    /// Flag flipped when the session is closed.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

/// Distinctive substring a scripted document must contain for the selector
/// to count as present.
fn marker(selector: &str) -> &str {
    selector.rsplit('.').next().unwrap_or(selector)
}

#[async_trait]
impl Session for FakeSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        self.visits.lock().unwrap().push(url.to_string());

        match self.scripts.get_mut(url) {
            None => Err(EntidadesError::browser(format!("no route to {url}"))),
            Some(PageScript::Unreachable) => {
                self.current = None;
                Err(EntidadesError::timeout(format!("navigation to {url}")))
            }
            Some(PageScript::Flaky {
                failures_left,
                html,
            }) => {
                if *failures_left > 0 {
                    *failures_left -= 1;
                    self.current = None;
                    Err(EntidadesError::timeout(format!("navigation to {url}")))
                } else {
                    self.current = Some(html.clone());
                    Ok(())
                }
            }
            Some(PageScript::Html(html)) => {
                self.current = Some(html.clone());
                Ok(())
            }
        }
    }

    async fn await_network_idle(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn await_selector(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<SelectorOutcome> {
        match &self.current {
            Some(html) if html.contains(marker(selector)) => Ok(SelectorOutcome::Found),
            _ => Ok(SelectorOutcome::TimedOut),
        }
    }

    async fn click(&mut self, _selector: &str) -> Result<()> {
        Ok(())
    }

    async fn document(&mut self) -> Result<String> {
        self.current
            .clone()
            .ok_or_else(|| EntidadesError::browser("no document loaded"))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(EntidadesError::browser("session closed twice"));
        }
        Ok(())
    }
}

/// Hands every worker a [`FakeSession`] over the same site map; selected
/// workers can be scripted to fail session acquisition outright.
pub struct FakeFactory {
    scripts: HashMap<String, PageScript>,
    fail_workers: Vec<u32>,
    opened: Arc<AtomicU32>,
}

impl FakeFactory {
    pub fn new(scripts: Vec<(String, PageScript)>) -> Self {
        Self {
            scripts: scripts.into_iter().collect(),
            fail_workers: Vec::new(),
            opened: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn failing_for(mut self, worker_id: u32) -> Self {
        self.fail_workers.push(worker_id);
        self
    }

    /// Counter of session acquisitions, shared with the test.
    pub fn opened_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.opened)
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    async fn open(&self, worker_id: u32) -> Result<FakeSession> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if self.fail_workers.contains(&worker_id) {
            return Err(EntidadesError::browser(format!(
                "no session for worker {worker_id}"
            )));
        }
        Ok(FakeSession::from_map(self.scripts.clone()))
    }
}

/// Run config with tiny delays for fast tests.
pub fn test_config() -> Arc<RunConfig> {
    test_config_with(2, 2)
}

pub fn test_config_with(total_pages: u32, worker_count: u32) -> Arc<RunConfig> {
    Arc::new(RunConfig {
        base_url: Url::parse("https://directory.test/entidades").unwrap(),
        total_pages,
        worker_count,
        navigation_timeout: Duration::from_millis(50),
        ready_timeout: Duration::from_millis(50),
        overlay_timeout: Duration::from_millis(50),
        max_attempts: 3,
        retry_delay: Duration::from_millis(1),
        throttle_delay: Duration::from_millis(1),
    })
}

/// Listing page with one row per `(name, href)`, plus the onboarding
/// overlay's cancel button.
pub fn listing_page(rows: &[(&str, &str)]) -> String {
    let mut body = String::from(
        "<html><body><button class=\"shepherd-cancel-icon\">×</button><table>\
         <tr><th>Entidad</th><th>RUC</th><th>Procesos</th><th>Monto</th><th>Último</th></tr>",
    );
    for (i, (name, href)) in rows.iter().enumerate() {
        body.push_str(&format!(
            "<tr><td><a href=\"{href}\">{name}</a></td>\
             <td>2013100{i}</td><td>{i}</td><td>S/ {i}.00</td><td>2024-01-0{i}</td></tr>"
        ));
    }
    body.push_str("</table></body></html>");
    body
}

/// Detail page with one location fragment and one phone fragment.
pub fn detail_page(location: &str, phone: &str) -> String {
    format!(
        "<html><body>\
         <div class=\"infoTextContainer\"><span>{location}</span></div>\
         <div class=\"infoTextContainer\"><span>{phone}</span></div>\
         </body></html>"
    )
}
