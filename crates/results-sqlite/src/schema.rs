pub const MIG_FRONTIER_INIT: &str = r#"
BEGIN;

CREATE TABLE IF NOT EXISTS onions (
  onion TEXT PRIMARY KEY
);

COMMIT;
"#
;

pub const MIG_RESULTS_INIT: &str = r#"
BEGIN;

CREATE TABLE IF NOT EXISTS combinedResults (
  hiddenService         TEXT PRIMARY KEY,
  dateScanned           TEXT,
  online                INTEGER,
  performedScans        TEXT,
  webDetected           INTEGER,
  tlsDetected           INTEGER,
  sshDetected           INTEGER,
  ricochetDetected      INTEGER,
  ircDetected           INTEGER,
  ftpDetected           INTEGER,
  smtpDetected          INTEGER,
  bitcoinDetected       INTEGER,
  mongodbDetected       INTEGER,
  vncDetected           INTEGER,
  xmppDetected          INTEGER,
  skynetDetected        INTEGER,
  crawls                TEXT,
  pgpKeys               TEXT,
  certificates          TEXT,
  bitcoinServices       TEXT,
  sshKey                TEXT,
  sshBanner             TEXT,
  ftpFingerprint        TEXT,
  ftpBanner             TEXT,
  smtpFingerprint       TEXT,
  smtpBanner            TEXT,
  lastAction            TEXT,
  timedOut              INTEGER,
  error                 TEXT,
  privateKeyDetected    INTEGER,
  foundApacheModStatus  INTEGER,
  foundApacheModInfo    INTEGER,
  serverVersion         TEXT,
  relatedOnionServices  TEXT,
  relatedOnionDomains   TEXT,
  ipAddresses           TEXT,
  emailAddresses        TEXT,
  analyticsIDs          TEXT,
  bitcoinAddresses      TEXT,
  linkedOnions          TEXT,
  openDirectories       TEXT,
  exifImages            TEXT,
  risks                 TEXT
);

CREATE TABLE IF NOT EXISTS runs (
  run_id          TEXT PRIMARY KEY,
  started_at      INTEGER NOT NULL,
  finished_at     INTEGER,
  tool_version    TEXT NOT NULL,
  frontier_size   INTEGER NOT NULL,
  completed       INTEGER DEFAULT 0,
  skipped         INTEGER DEFAULT 0,
  timeouts        INTEGER DEFAULT 0,
  empty_outputs   INTEGER DEFAULT 0
);

COMMIT;
"#
;

/// Column order of `combinedResults`, used for upserts and exports.
pub const RESULT_COLUMNS: [&str; 43] = [
    "hiddenService", "dateScanned", "online", "performedScans",
    "webDetected", "tlsDetected", "sshDetected", "ricochetDetected", "ircDetected", "ftpDetected",
    "smtpDetected", "bitcoinDetected", "mongodbDetected", "vncDetected", "xmppDetected", "skynetDetected",
    "crawls", "pgpKeys", "certificates", "bitcoinServices",
    "sshKey", "sshBanner", "ftpFingerprint", "ftpBanner", "smtpFingerprint", "smtpBanner",
    "lastAction", "timedOut", "error",
    "privateKeyDetected", "foundApacheModStatus", "foundApacheModInfo", "serverVersion",
    "relatedOnionServices", "relatedOnionDomains", "ipAddresses", "emailAddresses", "analyticsIDs",
    "bitcoinAddresses", "linkedOnions", "openDirectories", "exifImages", "risks",
];
