use std::io;

pub struct Config {
    value: toml::Value,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            value: toml::Value::Table(toml::map::Map::new()),
        }
    }
}

impl Config {
    /// Get an entry by path. If the input argument contains dots, the path is split
    /// into keys, each key being requested recursively.
    pub fn get<T: AsRef<str>>(&self, k: T) -> Option<&str> {
        let mut item = &self.value;
        for key in k.as_ref().split('.') {
            item = item.get(key)?;
        }
        item.as_str()
    }

    /// Get an entry of type integer by path
    pub fn get_usize<T: AsRef<str>>(&self, k: T) -> Option<usize> {
        let mut item = &self.value;
        for key in k.as_ref().split('.') {
            item = item.get(key)?;
        }
        item.as_integer()
            .and_then(|i| if i >= 0 { Some(i as usize) } else { None })
    }

    /// Get an entry of type boolean by path
    pub fn get_bool<T: AsRef<str>>(&self, k: T) -> Option<bool> {
        let mut item = &self.value;
        for key in k.as_ref().split('.') {
            item = item.get(key)?;
        }
        item.as_bool()
    }

    /// Set an entry by path, creating intermediate tables as needed.
    /// Does nothing if an intermediate key exists but is not a table.
    pub fn set<V: Into<toml::Value>>(&mut self, k: &str, v: V) {
        let mut value = Some(v.into());
        if let toml::Value::Table(table) = &mut self.value {
            let mut table = table;
            let mut keys = k.split('.').peekable();
            while let Some(key) = keys.next() {
                if keys.peek().is_none() {
                    if let Some(value) = value.take() {
                        table.insert(key.to_string(), value);
                    }
                    break;
                }
                let entry = table
                    .entry(key.to_string())
                    .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
                table = match entry {
                    toml::Value::Table(t) => t,
                    _ => return,
                };
            }
        }
    }

    /// Load configuration from input object. If keys are already present, they are overwritten
    pub fn load_config<R: io::Read>(&mut self, mut config: R) -> Result<(), io::Error> {
        let mut s = String::new();
        config.read_to_string(&mut s)?;
        // a configuration file is a TOML document, not a single value
        match s.parse::<toml::Table>() {
            Ok(table) => {
                self.value = toml::Value::Table(table);
                Ok(())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::Other,
                "Load configuration failed",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn get_dotted_path() {
        let mut config = Config::default();
        config
            .load_config(&b"[rewrite]\nsrc_ip = \"10.1.1.3\"\n"[..])
            .unwrap();
        assert_eq!(config.get("rewrite.src_ip"), Some("10.1.1.3"));
        assert_eq!(config.get("rewrite.dst_ip"), None);
    }

    #[test]
    fn load_full_document() {
        let doc = b"buffer_initial_capacity = 4096\n\n\
                    [rewrite]\nsrc_ip = \"10.1.1.3\"\ndst_ip = \"10.1.1.4\"\n\n\
                    [replay]\nhalt_record_on_send_error = false\n";
        let mut config = Config::default();
        config.load_config(&doc[..]).unwrap();
        assert_eq!(config.get_usize("buffer_initial_capacity"), Some(4096));
        assert_eq!(config.get("rewrite.src_ip"), Some("10.1.1.3"));
        assert_eq!(config.get("rewrite.dst_ip"), Some("10.1.1.4"));
        assert_eq!(config.get_bool("replay.halt_record_on_send_error"), Some(false));
    }

    #[test]
    fn set_creates_tables() {
        let mut config = Config::default();
        config.set("rewrite.src_mac", "02:00:00:00:00:01");
        assert_eq!(config.get("rewrite.src_mac"), Some("02:00:00:00:00:01"));
    }

    #[test]
    fn set_overrides_loaded_value() {
        let mut config = Config::default();
        config
            .load_config(&b"[replay]\nhalt_record_on_send_error = false\n"[..])
            .unwrap();
        assert_eq!(config.get_bool("replay.halt_record_on_send_error"), Some(false));
        config.set("replay.halt_record_on_send_error", true);
        assert_eq!(config.get_bool("replay.halt_record_on_send_error"), Some(true));
    }
}
