use crate::core::config::data::{path_display, Config};

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  routing-url: {}", describe(self.routing_url.as_deref(), &self.routing_url()));
        println!(
            "  default-endpoint: {}",
            describe(self.default_endpoint.as_deref(), &self.default_endpoint())
        );
        println!(
            "  default-endpoint-name: {}",
            describe(
                self.default_endpoint_name.as_deref(),
                &self.default_endpoint_name()
            )
        );
        match self.routing_timeout_secs {
            Some(secs) => println!("  routing-timeout: {secs}s"),
            None => println!("  routing-timeout: {}s (default)", self.routing_timeout_secs()),
        }
        match self.tool_timeout_secs {
            Some(secs) => println!("  tool-timeout: {secs}s"),
            None => println!("  tool-timeout: (unset)"),
        }
        match self.conversations_dir() {
            Ok(dir) if self.data_dir.is_some() => println!("  data-dir: {}", path_display(dir)),
            Ok(dir) => println!("  data-dir: {} (default)", path_display(dir)),
            Err(_) => println!("  data-dir: (unavailable)"),
        }
    }
}

fn describe(explicit: Option<&str>, effective: &str) -> String {
    match explicit {
        Some(value) => value.to_string(),
        None => format!("{effective} (default)"),
    }
}
