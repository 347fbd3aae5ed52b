use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    result::GatherError,
    types::{Show, Song, SongType},
};

use super::{
    theme::{parse_theme_line, ThemeLine},
    GatherOptions, Gatherer,
};

const ANN_NAME: &str = "ANN";
const ANN_API_URL: &str = "https://cdn.animenewsnetwork.com/encyclopedia/api.xml";
const USER_AGENT: &str = concat!("amqclip/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gatherer for the [Anime News Network](https://www.animenewsnetwork.com)
/// encyclopedia API
#[derive(Debug)]
pub struct AnimeNewsNetwork {
    client: reqwest::blocking::Client,
}

impl AnimeNewsNetwork {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }
}

impl Gatherer for AnimeNewsNetwork {
    fn name(&self) -> &str {
        ANN_NAME
    }

    fn fetch(&self, id: u32, options: &GatherOptions) -> Result<Show, GatherError> {
        let request_error = |source| GatherError::Request {
            gatherer: ANN_NAME.to_owned(),
            id,
            source,
        };

        info!("Requesting show {id} from {ANN_NAME}");
        let body = self
            .client
            .get(ANN_API_URL)
            .query(&[("anime", id)])
            .send()
            .and_then(|res| res.error_for_status())
            .and_then(|res| res.text())
            .map_err(request_error)?;

        debug!("{ANN_NAME} response is {} bytes long", body.len());
        parse_response(id, &body, options)
    }
}

#[derive(Debug, Deserialize)]
struct AnnResponse {
    #[serde(rename = "anime", default)]
    anime: Vec<AnnAnime>,
}

#[derive(Debug, Deserialize)]
struct AnnAnime {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "info", default)]
    infos: Vec<AnnInfo>,
}

#[derive(Debug, Deserialize)]
struct AnnInfo {
    #[serde(rename = "@type")]
    info_type: String,
    #[serde(rename = "#text", default)]
    text: String,
}

/// Which bucket an info category goes in, `None` for non-song infos
fn theme_bucket(info_type: &str, options: &GatherOptions) -> Option<Option<SongType>> {
    let (song_type, included) = match info_type {
        "Opening Theme" => (Some(SongType::Opening), options.include_openings),
        "Ending Theme" => (Some(SongType::Ending), options.include_endings),
        "Insert song" => (Some(SongType::Insert), options.include_inserts),
        "Theme Song" => (None, options.include_songs),
        _ => return None,
    };

    included.then_some(song_type)
}

/// Build a show out of the XML body of an ANN API response
pub fn parse_response(id: u32, body: &str, options: &GatherOptions) -> Result<Show, GatherError> {
    let response: AnnResponse =
        serde_xml_rs::from_str(body).map_err(|err| GatherError::Malformed {
            gatherer: ANN_NAME.to_owned(),
            id,
            reason: err.to_string(),
        })?;

    let anime = response
        .anime
        .into_iter()
        .find(|anime| anime.id == id)
        .ok_or_else(|| GatherError::NotFound {
            gatherer: ANN_NAME.to_owned(),
            id,
        })?;

    let year = anime
        .infos
        .iter()
        .find(|info| info.info_type == "Vintage")
        .and_then(|info| parse_year(&info.text))
        .unwrap_or_default();

    let mut show = Show::new(id, anime.name, year);
    for info in &anime.infos {
        let Some(song_type) = theme_bucket(&info.info_type, options) else {
            continue;
        };

        match parse_theme_line(&info.text) {
            Some(theme) => show.songs.push(to_song(theme, song_type)),
            None => debug!("Skipping unrecognized theme line {:?}", info.text),
        }
    }

    info!(
        "{ANN_NAME} show {id} is '{}' ({}) with {} songs",
        show.name,
        show.year,
        show.songs.len()
    );
    Ok(show)
}

fn to_song(theme: ThemeLine, song_type: Option<SongType>) -> Song {
    let ThemeLine {
        position,
        name,
        artist,
        episode,
    } = theme;

    let mut song = Song::new(name, artist);
    if let Some(song_type) = song_type {
        song = song.with_type(song_type, position);
    }
    song.episode = episode;
    song
}

/// The first run of 4 digits, e.g. "1998-04-03 to 1999-04-24" gives 1998
fn parse_year(vintage: &str) -> Option<i32> {
    vintage
        .split(|c: char| !c.is_ascii_digit())
        .find(|part| part.len() == 4)
        .and_then(|part| part.parse().ok())
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::types::{SongTypeAndPosition, Status, Timestamp};

    const BEBOP: &str = indoc! {r#"
        <ann>
        <anime id="13" gid="1234" type="TV" name="Cowboy Bebop" precision="TV">
        <info gid="1" type="Main title" lang="EN">Cowboy Bebop</info>
        <info gid="2" type="Vintage">1998-04-03 to 1999-04-24</info>
        <info gid="3" type="Opening Theme">"Tank!" by Seatbelts</info>
        <info gid="4" type="Ending Theme">#1: "The Real Folk Blues" by Mai Yamane (eps 1-12, 14-25)</info>
        <info gid="5" type="Ending Theme">#2: "Blue" by Mai Yamane (ep 26)</info>
        <info gid="6" type="Insert song">"Call me, call me" by Steve Conte</info>
        <info gid="7" type="Theme Song">"Ask DNA" by Seatbelts</info>
        <info gid="8" type="Ending Theme">Unknown</info>
        </anime>
        </ann>
    "#};

    #[test]
    fn test_parse_all_categories() {
        let show = parse_response(13, BEBOP, &GatherOptions::default()).unwrap();

        assert_eq!(show.id, 13);
        assert_eq!(show.name, "Cowboy Bebop");
        assert_eq!(show.year, 1998);
        assert_eq!(show.songs.len(), 5);

        let types: Vec<_> = show.songs.iter().map(|song| song.song_type).collect();
        assert_eq!(
            types,
            [
                Some(SongTypeAndPosition::new(SongType::Opening, None)),
                Some(SongTypeAndPosition::new(SongType::Ending, Some(1))),
                Some(SongTypeAndPosition::new(SongType::Ending, Some(2))),
                Some(SongTypeAndPosition::new(SongType::Insert, None)),
                None,
            ]
        );

        assert_eq!(show.songs[2].episode, Some(26));
        assert_eq!(show.songs[1].artist, "Mai Yamane");
    }

    #[test]
    fn test_new_songs_are_unset() {
        let show = parse_response(13, BEBOP, &GatherOptions::default()).unwrap();

        for song in &show.songs {
            assert_eq!(song.status, Status::empty());
            assert_eq!(song.start, Timestamp::ZERO);
            assert_eq!(song.end, Timestamp::ZERO);
            assert!(!song.should_ignore);
        }
    }

    #[test]
    fn test_options_filter_categories() {
        let options = GatherOptions {
            include_songs: false,
            include_openings: true,
            include_endings: false,
            include_inserts: false,
        };
        let show = parse_response(13, BEBOP, &options).unwrap();

        assert_eq!(show.songs.len(), 1);
        assert_eq!(show.songs[0].name, "Tank!");
    }

    #[test]
    fn test_not_found() {
        let body = "<ann><warning>no result for anime=999999</warning></ann>";
        let err = parse_response(999999, body, &GatherOptions::default()).unwrap_err();
        assert!(matches!(err, GatherError::NotFound { id: 999999, .. }));
    }

    #[test]
    fn test_malformed() {
        let err = parse_response(1, "<ann><anime", &GatherOptions::default()).unwrap_err();
        assert!(matches!(err, GatherError::Malformed { .. }));
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("1998-04-03 to 1999-04-24"), Some(1998));
        assert_eq!(parse_year("April 2004"), Some(2004));
        assert_eq!(parse_year("unknown"), None);
    }
}
