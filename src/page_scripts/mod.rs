//! Scripts evaluated inside the scraped tab.

use cdp_adapter::PageScript;

pub const LOCATION: &str = "reelscoutLocation";
pub const REEL_LINKS: &str = "reelscoutReelLinks";
pub const SCROLL: &str = "reelscoutScroll";
pub const SHOW_OVERLAY: &str = "reelscoutShowOverlay";
pub const HIDE_OVERLAY: &str = "reelscoutHideOverlay";
pub const PROFILE_PICTURE_ENTRY: &str = "reelscoutProfilePicture";

/// Text shown on the overlay while links are collected.
pub const OVERLAY_MESSAGE: &str = "Data collection in progress...";

/// Installs the location, link, scroll and overlay helpers.
pub const REEL_COLLECTION: PageScript =
    PageScript::new("collect_reels", include_str!("collect_reels.js"), REEL_LINKS);

pub const PROFILE_PICTURE: PageScript = PageScript::new(
    "profile_picture",
    include_str!("profile_picture.js"),
    PROFILE_PICTURE_ENTRY,
);
