use super::*;

#[serde_as]
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Settings {
  bitcoin_rpc_limit: Option<u32>,
  bitcoin_rpc_password: Option<String>,
  bitcoin_rpc_url: Option<String>,
  bitcoin_rpc_username: Option<String>,
  #[serde_as(as = "Option<DisplayFromStr>")]
  busy_poll_interval: Option<humantime::Duration>,
  chain: Option<Chain>,
  config: Option<PathBuf>,
  cookie_file: Option<PathBuf>,
  data_dir: Option<PathBuf>,
  index: Option<PathBuf>,
  #[serde_as(as = "Option<DisplayFromStr>")]
  info_interval: Option<humantime::Duration>,
  label: Option<String>,
  #[serde_as(as = "Option<DisplayFromStr>")]
  poll_interval: Option<humantime::Duration>,
}

impl Settings {
  const DEFAULT_BITCOIN_RPC_LIMIT: u32 = 12;
  const DEFAULT_BUSY_POLL_INTERVAL: Duration = Duration::from_secs(5);
  const DEFAULT_INFO_INTERVAL: Duration = Duration::from_secs(5);
  const DEFAULT_LABEL: &'static str = "cc-full-node";
  const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

  pub fn load(options: Options) -> Result<Settings> {
    let mut env = BTreeMap::<String, String>::new();

    for (var, value) in env::vars_os() {
      let Some(var) = var.to_str() else {
        continue;
      };

      let Some(key) = var.strip_prefix("CCNODE_") else {
        continue;
      };

      env.insert(
        key.into(),
        value.into_string().map_err(|value| {
          anyhow!(
            "environment variable `{var}` is not valid unicode: `{}`",
            value.to_string_lossy()
          )
        })?,
      );
    }

    Self::merge(options, env)
  }

  pub fn merge(options: Options, env: BTreeMap<String, String>) -> Result<Self> {
    let settings = Settings::from_options(options).or(Settings::from_env(env)?);

    let config = match &settings.config {
      Some(path) => {
        log::info!("Loading configuration from `{}`", path.display());
        serde_yaml::from_reader(
          File::open(path).snafu_context(error::Io { path: path.clone() })?,
        )
        .with_context(|| format!("failed to deserialize config `{}`", path.display()))?
      }
      None => Settings::default(),
    };

    let settings = settings.or(config).or_defaults()?;

    match (
      &settings.bitcoin_rpc_username,
      &settings.bitcoin_rpc_password,
    ) {
      (None, Some(_)) => bail!("no bitcoin RPC username specified"),
      (Some(_), None) => bail!("no bitcoin RPC password specified"),
      _ => {}
    }

    Ok(settings)
  }

  pub fn or(self, source: Settings) -> Self {
    Self {
      bitcoin_rpc_limit: self.bitcoin_rpc_limit.or(source.bitcoin_rpc_limit),
      bitcoin_rpc_password: self.bitcoin_rpc_password.or(source.bitcoin_rpc_password),
      bitcoin_rpc_url: self.bitcoin_rpc_url.or(source.bitcoin_rpc_url),
      bitcoin_rpc_username: self.bitcoin_rpc_username.or(source.bitcoin_rpc_username),
      busy_poll_interval: self.busy_poll_interval.or(source.busy_poll_interval),
      chain: self.chain.or(source.chain),
      config: self.config.or(source.config),
      cookie_file: self.cookie_file.or(source.cookie_file),
      data_dir: self.data_dir.or(source.data_dir),
      index: self.index.or(source.index),
      info_interval: self.info_interval.or(source.info_interval),
      label: self.label.or(source.label),
      poll_interval: self.poll_interval.or(source.poll_interval),
    }
  }

  pub fn from_options(options: Options) -> Self {
    Self {
      bitcoin_rpc_limit: options.bitcoin_rpc_limit,
      bitcoin_rpc_password: options.bitcoin_rpc_password,
      bitcoin_rpc_url: options.bitcoin_rpc_url,
      bitcoin_rpc_username: options.bitcoin_rpc_username,
      busy_poll_interval: options.busy_poll_interval,
      chain: options
        .testnet
        .then_some(Chain::Testnet)
        .or(options.regtest.then_some(Chain::Regtest))
        .or(options.chain_argument),
      config: options.config,
      cookie_file: options.cookie_file,
      data_dir: options.data_dir,
      index: options.index,
      info_interval: options.info_interval,
      label: options.label,
      poll_interval: options.poll_interval,
    }
  }

  pub fn from_env(env: BTreeMap<String, String>) -> Result<Self> {
    let get_string = |key: &str| env.get(key).cloned();

    let get_path = |key: &str| env.get(key).map(PathBuf::from);

    let get_chain = |key: &str| {
      env
        .get(key)
        .map(|chain| chain.parse::<Chain>())
        .transpose()
        .with_context(|| format!("failed to parse environment variable CCNODE_{key} as chain"))
    };

    let get_u32 = |key: &str| {
      env
        .get(key)
        .map(|value| value.parse::<u32>())
        .transpose()
        .with_context(|| format!("failed to parse environment variable CCNODE_{key} as u32"))
    };

    let get_duration = |key: &str| {
      env
        .get(key)
        .map(|value| value.parse::<humantime::Duration>())
        .transpose()
        .with_context(|| {
          format!("failed to parse environment variable CCNODE_{key} as duration")
        })
    };

    Ok(Self {
      bitcoin_rpc_limit: get_u32("BITCOIN_RPC_LIMIT")?,
      bitcoin_rpc_password: get_string("BITCOIN_RPC_PASSWORD"),
      bitcoin_rpc_url: get_string("BITCOIN_RPC_URL"),
      bitcoin_rpc_username: get_string("BITCOIN_RPC_USERNAME"),
      busy_poll_interval: get_duration("BUSY_POLL_INTERVAL")?,
      chain: get_chain("CHAIN")?,
      config: get_path("CONFIG"),
      cookie_file: get_path("COOKIE_FILE"),
      data_dir: get_path("DATA_DIR"),
      index: get_path("INDEX"),
      info_interval: get_duration("INFO_INTERVAL")?,
      label: get_string("LABEL"),
      poll_interval: get_duration("POLL_INTERVAL")?,
    })
  }

  pub fn or_defaults(self) -> Result<Self> {
    let chain = self.chain.unwrap_or_default();

    let data_dir = chain.join_with_data_dir(match &self.data_dir {
      Some(data_dir) => data_dir.clone(),
      None => Self::default_data_dir()?,
    });

    let index = self
      .index
      .clone()
      .unwrap_or_else(|| data_dir.join("index.redb"));

    Ok(Self {
      bitcoin_rpc_limit: Some(
        self
          .bitcoin_rpc_limit
          .unwrap_or(Self::DEFAULT_BITCOIN_RPC_LIMIT),
      ),
      bitcoin_rpc_password: self.bitcoin_rpc_password,
      bitcoin_rpc_url: Some(
        self
          .bitcoin_rpc_url
          .unwrap_or_else(|| format!("127.0.0.1:{}", chain.default_rpc_port())),
      ),
      bitcoin_rpc_username: self.bitcoin_rpc_username,
      busy_poll_interval: Some(
        self
          .busy_poll_interval
          .unwrap_or(Self::DEFAULT_BUSY_POLL_INTERVAL.into()),
      ),
      chain: Some(chain),
      config: self.config,
      cookie_file: self.cookie_file,
      data_dir: Some(data_dir),
      index: Some(index),
      info_interval: Some(
        self
          .info_interval
          .unwrap_or(Self::DEFAULT_INFO_INTERVAL.into()),
      ),
      label: Some(
        self
          .label
          .unwrap_or_else(|| Self::DEFAULT_LABEL.into()),
      ),
      poll_interval: Some(
        self
          .poll_interval
          .unwrap_or(Self::DEFAULT_POLL_INTERVAL.into()),
      ),
    })
  }

  fn default_data_dir() -> Result<PathBuf> {
    Ok(
      dirs::data_dir()
        .context("could not get data dir")?
        .join("ccnode"),
    )
  }

  fn default_cookie_file(chain: Chain) -> Result<PathBuf> {
    let bitcoin_dir = if cfg!(target_os = "linux") {
      dirs::home_dir()
        .context("could not get home dir")?
        .join(".bitcoin")
    } else {
      dirs::data_dir()
        .context("could not get data dir")?
        .join("Bitcoin")
    };

    Ok(chain.join_with_data_dir(bitcoin_dir).join(".cookie"))
  }

  pub fn bitcoin_credentials(&self) -> Result<Auth> {
    if let Some((user, pass)) = self
      .bitcoin_rpc_username
      .as_ref()
      .zip(self.bitcoin_rpc_password.as_ref())
    {
      return Ok(Auth::UserPass(user.clone(), pass.clone()));
    }

    let cookie_file = match &self.cookie_file {
      Some(cookie_file) => cookie_file.clone(),
      None => Self::default_cookie_file(self.chain())?,
    };

    log::info!("Using cookie file `{}`", cookie_file.display());

    Ok(Auth::CookieFile(cookie_file))
  }

  pub fn bitcoin_rpc_limit(&self) -> u32 {
    self
      .bitcoin_rpc_limit
      .unwrap_or(Self::DEFAULT_BITCOIN_RPC_LIMIT)
  }

  pub fn bitcoin_rpc_url(&self) -> String {
    self
      .bitcoin_rpc_url
      .clone()
      .unwrap_or_else(|| format!("127.0.0.1:{}", self.chain().default_rpc_port()))
  }

  pub fn busy_poll_interval(&self) -> Duration {
    self
      .busy_poll_interval
      .map(Into::into)
      .unwrap_or(Self::DEFAULT_BUSY_POLL_INTERVAL)
  }

  pub fn chain(&self) -> Chain {
    self.chain.unwrap_or_default()
  }

  pub fn index_path(&self) -> Result<PathBuf> {
    match (&self.index, &self.data_dir) {
      (Some(index), _) => Ok(index.clone()),
      (None, Some(data_dir)) => Ok(data_dir.join("index.redb")),
      (None, None) => Ok(
        self
          .chain()
          .join_with_data_dir(Self::default_data_dir()?)
          .join("index.redb"),
      ),
    }
  }

  pub fn info_interval(&self) -> Duration {
    self
      .info_interval
      .map(Into::into)
      .unwrap_or(Self::DEFAULT_INFO_INTERVAL)
  }

  pub fn label(&self) -> &str {
    self.label.as_deref().unwrap_or(Self::DEFAULT_LABEL)
  }

  pub fn poll_interval(&self) -> Duration {
    self
      .poll_interval
      .map(Into::into)
      .unwrap_or(Self::DEFAULT_POLL_INTERVAL)
  }
}
