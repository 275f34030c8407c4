use std::path::Path;

#[derive(Debug, Default, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dns: crate::dns::config::Config,
    #[serde(default)]
    pub records: crate::repository::records::Config,
    #[serde(default)]
    pub filters: crate::repository::filters::Config,
    #[serde(default)]
    pub lookup: crate::repository::lookup::Config,
}

impl Config {
    pub fn load(path: &Path) -> Self {
        let conf = ::config::Config::builder()
            .add_source(::config::File::from(path).required(true))
            .add_source(::config::Environment::default().separator("_"))
            .build()
            .expect("unable to locate configuration file");
        conf.try_deserialize()
            .expect("configuration format invalid")
    }
}
