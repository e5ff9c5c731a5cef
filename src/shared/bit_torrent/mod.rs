//! `BitTorrent` primitives shared by the tracker core and the delivery
//! layers.
pub mod info_hash;
pub mod torrent_file;
